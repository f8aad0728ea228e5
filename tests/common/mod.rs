//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use azulejo::bio::sequence::Sequence;
use azulejo::core::proteome::ProteinRecord;
use std::fs;
use std::path::{Path, PathBuf};

pub fn seq(id: &str, residues: &str) -> Sequence {
    Sequence::new(id.to_string(), residues.as_bytes().to_vec())
}

pub fn protein(id: &str, proteome: &str, frag: &str, pos: i64) -> ProteinRecord {
    ProteinRecord {
        id: id.to_string(),
        proteome: proteome.to_string(),
        frag: Some(frag.to_string()),
        pos: Some(pos),
        len: 100,
    }
}

/// Write `(id, residues)` records as FASTA.
pub fn write_fasta_file(dir: &Path, name: &str, records: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut text = String::new();
    for (id, residues) in records {
        text.push_str(&format!(">{}\n{}\n", id, residues));
    }
    fs::write(&path, text).unwrap();
    path
}

/// Write an `id`/`frag`/`pos` positions table as TSV.
pub fn write_positions(dir: &Path, name: &str, rows: &[(&str, &str, i64)]) -> PathBuf {
    let path = dir.join(name);
    let mut text = String::from("id\tfrag\tpos\n");
    for (id, frag, pos) in rows {
        text.push_str(&format!("{}\t{}\t{}\n", id, frag, pos));
    }
    fs::write(&path, text).unwrap();
    path
}

/// Write an executable shell script standing in for an external binary.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A usearch stand-in that clusters identical sequences together and
/// writes UC records to the `-uc` argument.
pub const IDENTICAL_USEARCH: &str = r#"#!/bin/sh
in=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -cluster_fast) in="$2"; shift ;;
    -uc) out="$2"; shift ;;
    --version) echo "usearch v11.0.667"; exit 0 ;;
  esac
  shift
done
awk -v OFS='\t' '
function emit() {
  if (!(seq in c)) { c[seq] = n++; print "S", c[seq], length(seq), "*", "*", "*", "*", "*", id, "*" }
  else { print "H", c[seq], length(seq), "100.0", "+", "0", "0", "*", id, "*" }
}
/^>/ { if (id != "") emit(); id = substr($1, 2); seq = ""; next }
{ seq = seq $0 }
END { if (id != "") emit() }
' "$in" > "$out"
"#;

pub const FAILING_TOOL: &str = "#!/bin/sh\necho 'license expired' >&2\nexit 3\n";

/// Two proteomes of four proteins on one fragment; A_i and B_i are
/// identical, every i distinct.
pub const FAMILY: [&str; 4] = ["MKVLAAGGTT", "WWPPRRKKEE", "HHCCYYFFNN", "QQSSDDIILL"];

pub fn write_two_proteome_manifest(dir: &Path, b_positions: [i64; 4]) -> PathBuf {
    let a: Vec<(String, &str)> = (0..4).map(|i| (format!("A{}", i + 1), FAMILY[i])).collect();
    let b: Vec<(String, &str)> = (0..4).map(|i| (format!("B{}", i + 1), FAMILY[i])).collect();
    let a_refs: Vec<(&str, &str)> = a.iter().map(|(id, s)| (id.as_str(), *s)).collect();
    let b_refs: Vec<(&str, &str)> = b.iter().map(|(id, s)| (id.as_str(), *s)).collect();
    write_fasta_file(dir, "a.faa", &a_refs);
    write_fasta_file(dir, "b.faa", &b_refs);

    let a_pos: Vec<(&str, &str, i64)> = a
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (id.as_str(), "chr1", i as i64 + 1))
        .collect();
    let b_pos: Vec<(&str, &str, i64)> = b
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (id.as_str(), "chr1", b_positions[i]))
        .collect();
    write_positions(dir, "a.pos.tsv", &a_pos);
    write_positions(dir, "b.pos.tsv", &b_pos);

    let manifest = dir.join("proteomes.toml");
    fs::write(
        &manifest,
        r#"[[proteome]]
name = "A"
fasta = "a.faa"
positions = "a.pos.tsv"
rank = 1

[[proteome]]
name = "B"
fasta = "b.faa"
positions = "b.pos.tsv"
rank = 2
"#,
    )
    .unwrap();
    manifest
}
