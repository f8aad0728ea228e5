//! Record counting, trimming and splitting of FASTA files.
use azulejo::bio::fasta::parse_fasta;
use azulejo::bio::index::{fasta_records, split_fasta, trim_fasta};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

fn record_strategy() -> impl Strategy<Value = (String, String, String)> {
    (
        "[a-z][a-z0-9_]{0,8}",
        // descriptions may carry '>' anywhere but at the start of a line
        "[ a-z>|=]{0,12}",
        "[ACDEFGHIKLMNPQRSTVWY]{1,150}",
    )
}

fn render(records: &[(String, String, String)]) -> String {
    let mut text = String::new();
    for (i, (id, desc, residues)) in records.iter().enumerate() {
        text.push_str(&format!(">{}{} {}\n", id, i, desc));
        for line in residues.as_bytes().chunks(60) {
            text.push_str(std::str::from_utf8(line).unwrap());
            text.push('\n');
        }
    }
    text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_record_count_matches_header_lines(
        records in prop::collection::vec(record_strategy(), 1..30),
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.faa");
        let text = render(&records);
        fs::write(&path, &text).unwrap();

        let index = fasta_records(&path).unwrap();
        let headers = text.lines().filter(|l| l.starts_with('>')).count();
        prop_assert_eq!(index.records(), headers);
        prop_assert_eq!(index.total_bytes, text.len());
    }

    #[test]
    fn prop_trim_keeps_leading_records(
        records in prop::collection::vec(record_strategy(), 1..20),
        keep in 0usize..25,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.faa");
        let text = render(&records);
        fs::write(&path, &text).unwrap();

        let before = trim_fasta(&path, keep).unwrap();
        prop_assert_eq!(before.records(), records.len());
        prop_assert_eq!(before.total_bytes, text.len());

        let kept = keep.min(records.len());
        let after = fasta_records(&path).unwrap();
        prop_assert_eq!(after.records(), kept);
        let expected = render(&records[..kept]);
        prop_assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    }

    #[test]
    fn prop_split_preserves_every_record(
        records in prop::collection::vec(record_strategy(), 1..30),
        per_file in 1usize..7,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.faa");
        let text = render(&records);
        fs::write(&path, &text).unwrap();

        let chunks = split_fasta(&path, per_file, dir.path().join("chunks")).unwrap();
        prop_assert_eq!(chunks.len(), records.len().div_ceil(per_file));

        let mut joined = String::new();
        for chunk in &chunks {
            let n = fasta_records(chunk).unwrap().records();
            prop_assert!(n >= 1 && n <= per_file);
            joined.push_str(&fs::read_to_string(chunk).unwrap());
        }
        prop_assert_eq!(joined, text);
    }
}

#[test]
fn test_trimmed_file_still_parses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("in.faa");
    fs::write(&path, ">a one\nMKV\nLLA\n>b\nGG\n>c\nWW\n").unwrap();
    trim_fasta(&path, 2).unwrap();
    let sequences = parse_fasta(&path).unwrap();
    let ids: Vec<&str> = sequences.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(sequences[0].sequence, b"MKVLLA".to_vec());
}

#[test]
fn test_missing_file_is_input_not_found() {
    let dir = TempDir::new().unwrap();
    let err = fasta_records(dir.path().join("absent.faa")).unwrap_err();
    assert!(matches!(err, azulejo::AzulejoError::InputNotFound(_)));
}
