//! Subprocess wrappers driven by shell-script stand-ins.
#![cfg(unix)]

mod common;

use azulejo::core::cluster_builder::build_clusters;
use azulejo::core::config::Config;
use azulejo::tools::{
    Aligner, Anchor, Clusterer, ColinearityDetector, DagChainer, MuscleAligner, Tool, ToolManager,
    UsearchClusterer,
};
use azulejo::AzulejoError;
use common::{fake_tool, seq, FAILING_TOOL, IDENTICAL_USEARCH};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn test_usearch_output_becomes_cluster_table() {
    let dir = TempDir::new().unwrap();
    let binary = fake_tool(dir.path(), "usearch", IDENTICAL_USEARCH);
    let clusterer = UsearchClusterer::new(&binary);

    let sequences = vec![
        seq("x1", "MKVLATTTGG"),
        seq("x2", "MKVLATTTGG"),
        seq("x3", "MKVLATTTGG"),
        seq("y1", "WWWWPPPPRR"),
    ];
    let table = build_clusters(&clusterer, &sequences, 1.0).unwrap();
    assert_eq!(table.n_clusters(), 2);
    assert_eq!(table.clusters()[0].members, vec!["x1", "x2", "x3"]);
    assert_eq!(table.clusters()[1].members, vec!["y1"]);
    assert!(clusterer.verify_installation().is_ok());
}

#[test]
fn test_failing_clusterer_is_a_clustering_tool_error() {
    let dir = TempDir::new().unwrap();
    let binary = fake_tool(dir.path(), "usearch", FAILING_TOOL);
    let clusterer = UsearchClusterer::new(&binary);

    let err = clusterer.cluster(&[seq("a", "MKV")], 0.9).unwrap_err();
    match err {
        AzulejoError::ClusteringTool(message) => assert!(message.contains("license expired")),
        other => panic!("expected a clustering tool error, got {:?}", other),
    }
}

fn anchor(i: i64) -> Anchor {
    Anchor {
        a_id: format!("A{}", i),
        b_id: format!("B{}", i),
        a_frag: "chr1".to_string(),
        b_frag: "chr1".to_string(),
        a_pos: i,
        b_pos: i,
        cluster: i,
    }
}

#[test]
fn test_failing_aligner_is_an_alignment_tool_error() {
    let dir = TempDir::new().unwrap();
    let aligner = MuscleAligner::new(fake_tool(dir.path(), "muscle", FAILING_TOOL));

    let out = dir.path().join("0.faa");
    let err = aligner.align(&[seq("a", "MKV"), seq("b", "MKL")], &out).unwrap_err();
    match err {
        AzulejoError::AlignmentTool(message) => assert!(message.contains("license expired")),
        other => panic!("expected an alignment tool error, got {:?}", other),
    }
}

#[test]
fn test_silent_aligner_without_output_is_an_alignment_tool_error() {
    let dir = TempDir::new().unwrap();
    let aligner = MuscleAligner::new(fake_tool(dir.path(), "muscle", "#!/bin/sh
exit 0
"));

    let out = dir.path().join("0.faa");
    let err = aligner.align(&[seq("a", "MKV"), seq("b", "MKL")], &out).unwrap_err();
    match err {
        AzulejoError::AlignmentTool(message) => assert!(message.contains("wrote no alignment")),
        other => panic!("expected an alignment tool error, got {:?}", other),
    }
    assert!(!out.exists());
}

#[test]
fn test_failing_chainer_is_a_synteny_tool_error() {
    let dir = TempDir::new().unwrap();
    let chainer = DagChainer::new(fake_tool(dir.path(), "dagchainer", FAILING_TOOL));

    let anchors: Vec<Anchor> = (1..=3).map(anchor).collect();
    let err = chainer.chain(&anchors, 2, 2).unwrap_err();
    match err {
        AzulejoError::SyntenyTool(message) => assert!(message.contains("license expired")),
        other => panic!("expected a synteny tool error, got {:?}", other),
    }
}

#[test]
fn test_tool_manager_finds_explicit_binary() {
    let dir = TempDir::new().unwrap();
    let binary = fake_tool(dir.path(), "usearch", IDENTICAL_USEARCH);
    let mut config = Config::default();
    config.clustering.binary = binary.display().to_string();
    config.alignment.binary = dir.path().join("no-muscle").display().to_string();

    let manager = ToolManager::new(&config);
    let status = manager.status(Tool::Usearch);
    assert_eq!(status.path.as_deref(), Some(binary.as_path()));
    assert_eq!(status.version.as_deref(), Some("11.0.667"));

    assert!(matches!(
        manager.require(Tool::Muscle),
        Err(AzulejoError::AlignmentTool(_))
    ));
}
