//! Persistence of tables in both physical formats.
use azulejo::storage::{read_table, write_table, write_table_with, Codec, Column, DType, Table};
use azulejo::AzulejoError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

fn sample() -> Table {
    Table::new()
        .with_key("id")
        .with_column("len", Column::ints([120, 87, 301]))
        .unwrap()
        .with_column("id", Column::strings(["p1", "p2", "p3"]))
        .unwrap()
        .with_column("frag", Column::Utf8(vec![Some("chr1".into()), None, Some("chr2".into())]))
        .unwrap()
        .with_column("pos", Column::Int64(vec![Some(1), None, Some(7)]))
        .unwrap()
        .with_column("score", Column::floats([0.5, 1.25, -3.0]))
        .unwrap()
        .with_column("is_rep", Column::bools([true, false, true]))
        .unwrap()
        .with_column("tmp.scratch", Column::ints([0, 0, 0]))
        .unwrap()
}

#[rstest]
#[case(Codec::Zstd)]
#[case(Codec::Snappy)]
#[case(Codec::Uncompressed)]
fn test_parquet_round_trip_is_lossless(#[case] codec: Codec) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.parquet");
    write_table_with(&sample(), &path, codec).unwrap();

    let back = read_table(&path).unwrap();
    let expected = sample().normalized();
    assert_eq!(back.column_names(), expected.column_names());
    assert_eq!(back.dtypes(), expected.dtypes());
    for name in expected.column_names() {
        assert_eq!(back.column(name).unwrap(), expected.column(name).unwrap());
    }
}

#[test]
fn test_persisted_layout_drops_transient_columns_and_leads_with_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.parquet");
    write_table(&sample(), &path).unwrap();
    let back = read_table(&path).unwrap();
    assert_eq!(back.column_names()[0], "id");
    assert!(!back.has_column("tmp.scratch"));
}

#[test]
fn test_tsv_round_trip_preserves_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.tsv");
    write_table(&sample(), &path).unwrap();

    let back = read_table(&path).unwrap();
    let expected = sample().normalized();
    assert_eq!(back.column_names(), expected.column_names());
    assert_eq!(back.str_values("id").unwrap(), vec!["p1", "p2", "p3"]);
    assert_eq!(back.opt_int_values("pos").unwrap(), vec![Some(1), None, Some(7)]);
    assert_eq!(back.int_values("len").unwrap(), vec![120, 87, 301]);
    assert_eq!(back.float_values("score").unwrap(), vec![0.5, 1.25, -3.0]);
    assert_eq!(back.bool_values("is_rep").unwrap(), vec![true, false, true]);
    assert_eq!(
        back.opt_str_values("frag").unwrap(),
        vec![Some("chr1".to_string()), None, Some("chr2".to_string())]
    );
}

#[test]
fn test_tsv_infers_types() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.tsv");
    std::fs::write(&path, "a\tb\tc\td\n1\t1.5\ttrue\tx\n2\t\tfalse\ty\n").unwrap();
    let table = read_table(&path).unwrap();
    let dtypes: Vec<DType> = table.dtypes().into_iter().map(|(_, d)| d).collect();
    assert_eq!(
        dtypes,
        vec![DType::Int64, DType::Float64, DType::Boolean, DType::Utf8]
    );
}

#[test]
fn test_unrecognized_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.xlsx");
    assert!(matches!(
        write_table(&sample(), &path),
        Err(AzulejoError::UnrecognizedFormat(_))
    ));
    assert!(matches!(
        read_table(&path),
        Err(AzulejoError::UnrecognizedFormat(_))
    ));
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        read_table(dir.path().join("absent.parquet")),
        Err(AzulejoError::InputNotFound(_))
    ));
}
