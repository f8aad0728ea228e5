//! Proteome ingest and protein records.
//!
//! A manifest lists each proteome's FASTA and, optionally, a positions table
//! (`id`, `frag`, `pos`) placing its proteins on fragments. Ingest writes the
//! proteomes table, the proteins table and one combined FASTA.
use super::paths;
use crate::bio::fasta::{parse_fasta, write_fasta};
use crate::bio::sequence::Sequence;
use crate::storage::{read_table, write_table_with, Codec, Column, Table, TableFormat};
use crate::{AzulejoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub fasta: PathBuf,
    #[serde(default)]
    pub positions: Option<PathBuf>,
    /// Preferred ordering; lower ranks first, unranked proteomes last.
    #[serde(default)]
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "proteome", default)]
    pub proteomes: Vec<ManifestEntry>,
}

impl Manifest {
    /// Load a manifest, resolving relative paths against its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AzulejoError::InputNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut manifest: Manifest = toml::from_str(&text)
            .map_err(|e| AzulejoError::Parse(format!("{}: {}", path.display(), e)))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for entry in &mut manifest.proteomes {
            if entry.fasta.is_relative() {
                entry.fasta = base.join(&entry.fasta);
            }
            if let Some(pos) = &entry.positions {
                if pos.is_relative() {
                    entry.positions = Some(base.join(pos));
                }
            }
        }
        Ok(manifest)
    }
}

/// One protein as carried through homology and synteny.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinRecord {
    pub id: String,
    pub proteome: String,
    pub frag: Option<String>,
    pub pos: Option<i64>,
    pub len: usize,
}

/// Read `id`, `proteome`, `frag`, `pos`, `len` from a proteins table.
/// `frag` and `pos` may be absent or null.
pub fn proteins_from_table(table: &Table) -> Result<Vec<ProteinRecord>> {
    let ids = table.str_values("id")?;
    let proteomes = table.str_values("proteome")?;
    let lens = table.int_values("len")?;
    let frags = if table.has_column("frag") {
        table.opt_str_values("frag")?
    } else {
        vec![None; ids.len()]
    };
    let positions = if table.has_column("pos") {
        table.opt_int_values("pos")?
    } else {
        vec![None; ids.len()]
    };

    let mut records = Vec::with_capacity(ids.len());
    for (i, id) in ids.into_iter().enumerate() {
        let len = usize::try_from(lens[i]).map_err(|_| {
            AzulejoError::InvalidInput(format!("protein {} has negative length", id))
        })?;
        records.push(ProteinRecord {
            id,
            proteome: proteomes[i].clone(),
            frag: frags[i].clone().filter(|f| !f.is_empty()),
            pos: positions[i],
            len,
        });
    }
    Ok(records)
}

#[derive(Debug)]
pub struct Ingested {
    pub proteomes: Table,
    pub proteins: Table,
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone)]
struct Placement {
    frag: String,
    pos: i64,
}

/// Read every proteome of a manifest into the proteomes and proteins tables.
pub fn ingest(manifest: &Manifest) -> Result<Ingested> {
    if manifest.proteomes.is_empty() {
        return Err(AzulejoError::InvalidInput(
            "manifest lists no proteomes".to_string(),
        ));
    }
    let mut names = HashSet::new();
    for entry in &manifest.proteomes {
        if !names.insert(entry.name.as_str()) {
            return Err(AzulejoError::InvalidInput(format!(
                "proteome {} is listed twice",
                entry.name
            )));
        }
    }

    let mut ordered: Vec<&ManifestEntry> = manifest.proteomes.iter().collect();
    ordered.sort_by_key(|e| (e.rank.is_none(), e.rank));

    let mut pt = ProteomeColumns::default();
    let mut rows = ProteinColumns::default();
    let mut sequences = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (proteome_id, entry) in ordered.into_iter().enumerate() {
        let records = parse_fasta(&entry.fasta)?;
        let positions = match &entry.positions {
            Some(path) => Some(read_table(path)?),
            None => None,
        };
        let placement = match &positions {
            Some(table) => positions_by_id(table)?,
            None => HashMap::new(),
        };

        let mut fragments = BTreeSet::new();
        for seq in &records {
            if !seen_ids.insert(seq.id.clone()) {
                return Err(AzulejoError::InvalidInput(format!(
                    "protein id {} occurs more than once (in {})",
                    seq.id, entry.name
                )));
            }
            let place = placement.get(&seq.id);
            if let Some(p) = place {
                fragments.insert(p.frag.as_str());
            }
            rows.id.push(seq.id.clone());
            rows.proteome.push(entry.name.clone());
            rows.frag.push(place.map(|p| p.frag.clone()));
            rows.pos.push(place.map(|p| p.pos));
            rows.len.push(Some(seq.len() as i64));
            rows.hash.push(seq.content_hash());
        }

        if !placement.is_empty() {
            let fasta_ids: HashSet<&str> = records.iter().map(|s| s.id.as_str()).collect();
            let orphans = placement
                .keys()
                .filter(|id| !fasta_ids.contains(id.as_str()))
                .count();
            if orphans > 0 {
                warn!(
                    "{}: {} positioned proteins are missing from {}",
                    entry.name,
                    orphans,
                    entry.fasta.display()
                );
            }
        }

        info!(
            "Ingested {} proteins on {} fragments from {}",
            records.len(),
            fragments.len(),
            entry.name
        );
        pt.id.push(proteome_id as i64);
        pt.name.push(entry.name.clone());
        pt.rank.push(entry.rank);
        pt.path.push(entry.fasta.display().to_string());
        pt.n_proteins.push(records.len() as i64);
        pt.n_fragments.push(fragments.len() as i64);
        sequences.extend(records);
    }

    Ok(Ingested {
        proteomes: pt.into_table()?,
        proteins: rows.into_table()?,
        sequences,
    })
}

/// Run [`ingest`] and write its outputs into `out_dir`.
pub fn ingest_to_dir(
    manifest: &Manifest,
    out_dir: &Path,
    format: TableFormat,
    codec: Codec,
) -> Result<Ingested> {
    std::fs::create_dir_all(out_dir)?;
    let ingested = ingest(manifest)?;
    write_table_with(
        &ingested.proteomes,
        paths::table_path(out_dir, paths::PROTEOMES_TABLE, format),
        codec,
    )?;
    write_table_with(
        &ingested.proteins,
        paths::table_path(out_dir, paths::PROTEINS_TABLE, format),
        codec,
    )?;
    write_fasta(out_dir.join(paths::COMBINED_FASTA), &ingested.sequences)?;
    Ok(ingested)
}

fn positions_by_id(table: &Table) -> Result<HashMap<String, Placement>> {
    let ids = table.opt_str_values("id")?;
    let frags = table.opt_str_values("frag")?;
    let positions = table.opt_int_values("pos")?;

    let mut out = HashMap::with_capacity(ids.len());
    for ((id, frag), pos) in ids.into_iter().zip(frags).zip(positions) {
        let (Some(id), Some(frag), Some(pos)) = (id, frag, pos) else {
            continue;
        };
        if out.contains_key(&id) {
            return Err(AzulejoError::InvalidInput(format!(
                "protein {} is positioned twice",
                id
            )));
        }
        out.insert(id, Placement { frag, pos });
    }
    Ok(out)
}

#[derive(Default)]
struct ProteomeColumns {
    id: Vec<i64>,
    name: Vec<String>,
    rank: Vec<Option<i64>>,
    path: Vec<String>,
    n_proteins: Vec<i64>,
    n_fragments: Vec<i64>,
}

impl ProteomeColumns {
    fn into_table(self) -> Result<Table> {
        Table::new()
            .with_key("id")
            .with_column("id", Column::ints(self.id))?
            .with_column("name", Column::strings(self.name))?
            .with_column("rank", Column::Int64(self.rank))?
            .with_column("path", Column::strings(self.path))?
            .with_column("n_proteins", Column::ints(self.n_proteins))?
            .with_column("n_fragments", Column::ints(self.n_fragments))
    }
}

#[derive(Default)]
struct ProteinColumns {
    id: Vec<String>,
    proteome: Vec<String>,
    frag: Vec<Option<String>>,
    pos: Vec<Option<i64>>,
    len: Vec<Option<i64>>,
    hash: Vec<String>,
}

impl ProteinColumns {
    fn into_table(self) -> Result<Table> {
        Table::new()
            .with_key("id")
            .with_column("id", Column::strings(self.id))?
            .with_column("proteome", Column::strings(self.proteome))?
            .with_column("frag", Column::Utf8(self.frag))?
            .with_column("pos", Column::Int64(self.pos))?
            .with_column("len", Column::Int64(self.len))?
            .with_column("hash", Column::strings(self.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).unwrap();
    }

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.faa", ">a1\nMKV\n>a2\nMKVL\n");
        write(dir.path(), "b.faa", ">b1\nMKV\n");
        write(dir.path(), "a_pos.tsv", "id\tfrag\tpos\na1\tchr1\t1\na2\tchr2\t1\n");
        write(
            dir.path(),
            "manifest.toml",
            r#"
            [[proteome]]
            name = "b"
            fasta = "b.faa"

            [[proteome]]
            name = "a"
            fasta = "a.faa"
            positions = "a_pos.tsv"
            rank = 1
            "#,
        );
        dir
    }

    #[test]
    fn test_ingest() {
        let dir = setup();
        let manifest = Manifest::load(dir.path().join("manifest.toml")).unwrap();
        let ingested = ingest(&manifest).unwrap();

        assert_eq!(ingested.proteomes.str_values("name").unwrap(), vec!["a", "b"]);
        assert_eq!(ingested.proteomes.int_values("n_fragments").unwrap(), vec![2, 0]);
        assert_eq!(ingested.proteins.n_rows(), 3);

        let records = proteins_from_table(&ingested.proteins).unwrap();
        assert_eq!(records[0].frag.as_deref(), Some("chr1"));
        assert_eq!(records[2].proteome, "b");
        assert_eq!(records[2].pos, None);

        let hashes = ingested.proteins.str_values("hash").unwrap();
        assert_eq!(hashes[0], hashes[2]);
    }

    #[test]
    fn test_duplicate_protein_ids() {
        let dir = setup();
        write(dir.path(), "b.faa", ">a1\nMKV\n");
        let manifest = Manifest::load(dir.path().join("manifest.toml")).unwrap();
        assert!(matches!(ingest(&manifest), Err(AzulejoError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_fasta() {
        let dir = setup();
        std::fs::remove_file(dir.path().join("b.faa")).unwrap();
        let manifest = Manifest::load(dir.path().join("manifest.toml")).unwrap();
        assert!(matches!(ingest(&manifest), Err(AzulejoError::InputNotFound(_))));
    }

    #[test]
    fn test_ingest_to_dir() {
        let dir = setup();
        let manifest = Manifest::load(dir.path().join("manifest.toml")).unwrap();
        let out = dir.path().join("out");
        ingest_to_dir(&manifest, &out, TableFormat::Parquet, Codec::Zstd).unwrap();
        let proteins = read_table(out.join("proteins.parquet")).unwrap();
        assert_eq!(proteins.column_names()[0], "id");
        assert!(out.join("proteins.faa").exists());
    }
}
