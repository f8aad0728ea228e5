//! End-to-end runs of the `azulejo` binary.
mod common;

use assert_cmd::Command;
use azulejo::storage::read_table;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn azulejo(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("azulejo").unwrap();
    cmd.current_dir(dir)
        .env_remove("AZULEJO_CONFIG")
        .env_remove("AZULEJO_LOG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    azulejo(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cluster-in-steps"))
        .stdout(predicate::str::contains("annotate-homology"))
        .stdout(predicate::str::contains("synteny"));
}

#[test]
fn test_config_prints_defaults() {
    let dir = TempDir::new().unwrap();
    azulejo(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[clustering]"))
        .stdout(predicate::str::contains("binary = \"usearch\""));
}

#[test]
fn test_config_round_trips_through_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("written.toml");
    azulejo(dir.path())
        .args(["config", "--output"])
        .arg(&path)
        .assert()
        .success();
    let loaded = azulejo::core::config::load_config(&path).unwrap();
    assert_eq!(loaded, azulejo::Config::default());
}

#[test]
fn test_index_counts_records() {
    let dir = TempDir::new().unwrap();
    common::write_fasta_file(dir.path(), "in.faa", &[("a", "MKV"), ("b", "LL"), ("c", "W")]);
    azulejo(dir.path())
        .args(["index", "in.faa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Records"))
        .stdout(predicate::str::contains("3"));
}

#[test]
fn test_missing_config_exits_with_io_code() {
    let dir = TempDir::new().unwrap();
    azulejo(dir.path())
        .args(["--config", "absent.toml", "config"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_config_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.toml"), "[synteny]\nmax_gap = 0\n").unwrap();
    azulejo(dir.path())
        .args(["--config", "bad.toml", "config"])
        .assert()
        .code(2);
}

#[test]
fn test_unrecognized_table_format_exits_with_format_code() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.xlsx"), "x").unwrap();
    fs::write(dir.path().join("b.xlsx"), "x").unwrap();
    azulejo(dir.path())
        .args(["compare-clusters", "a.xlsx", "b.xlsx"])
        .assert()
        .code(4);
}

#[test]
fn test_strict_mode_fails_on_unpositioned_proteome() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("annotated.tsv"),
        "id\tproteome\tfrag\tpos\tlen\thom_cluster\n\
         A1\tA\tchr1\t1\t100\t0\n\
         A2\tA\tchr1\t2\t100\t1\n\
         C1\tC\t\t\t100\t0\n",
    )
    .unwrap();

    azulejo(dir.path())
        .args(["synteny", "annotated.tsv", "--format", "tsv"])
        .assert()
        .success();
    azulejo(dir.path())
        .args(["-e", "synteny", "annotated.tsv", "--format", "tsv"])
        .assert()
        .code(6);
}

#[cfg(unix)]
#[test]
fn test_missing_clusterer_exits_with_tool_code() {
    let dir = TempDir::new().unwrap();
    common::write_fasta_file(dir.path(), "in.faa", &[("a", "MKV")]);
    fs::write(
        dir.path().join("azulejo.toml"),
        "[clustering]\nbinary = \"./no-such-usearch\"\n",
    )
    .unwrap();
    azulejo(dir.path())
        .args(["cluster", "in.faa", "--identity", "0.9"])
        .assert()
        .code(5);
}

#[cfg(unix)]
#[test]
fn test_pipeline_from_manifest_to_proxies() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let usearch = common::fake_tool(root, "usearch", common::IDENTICAL_USEARCH);
    common::write_two_proteome_manifest(root, [4, 3, 2, 1]);
    fs::write(
        root.join("azulejo.toml"),
        format!(
            "[clustering]\nbinary = \"{}\"\n\n[output]\nformat = \"tsv\"\n",
            usearch.display()
        ),
    )
    .unwrap();

    azulejo(root).args(["ingest", "proteomes.toml"]).assert().success();
    assert!(root.join("proteins.tsv").exists());
    assert!(root.join("proteomes.tsv").exists());

    azulejo(root)
        .args(["cluster", "proteins.faa", "--identity", "1.0"])
        .assert()
        .success();
    let clusters = read_table(root.join("proteins-azulejo_clusts.tsv")).unwrap();
    assert_eq!(clusters.n_rows(), 8);

    azulejo(root)
        .args([
            "annotate-homology",
            "--proteins",
            "proteins.tsv",
            "proteins-azulejo_clusts.tsv",
        ])
        .assert()
        .success();
    let all_ids = read_table(root.join("proteins-azulejo_ids-all.tsv")).unwrap();
    assert_eq!(all_ids.n_rows(), 4);

    azulejo(root)
        .args(["synteny", "proteins-azulejo_homology.tsv"])
        .assert()
        .success();
    let proxies = read_table(root.join("proteins-azulejo_proxies.tsv")).unwrap();
    assert_eq!(proxies.n_rows(), 1);
    assert_eq!(proxies.str_values("direction").unwrap(), vec!["-"]);
    assert_eq!(proxies.int_values("length").unwrap(), vec![4]);
}
