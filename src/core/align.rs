//! Per-cluster multiple alignment.
use super::cluster_builder::ClusterTable;
use crate::bio::sequence::Sequence;
use crate::tools::Aligner;
use crate::{AzulejoError, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Align every cluster with at least `min_size` members into
/// `<out_dir>/<cluster>.faa`. Returns the written paths in cluster order.
pub fn align_clusters(
    aligner: &dyn Aligner,
    table: &ClusterTable,
    sequences: &[Sequence],
    out_dir: &Path,
    min_size: usize,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let by_id: HashMap<&str, &Sequence> = sequences.iter().map(|s| (s.id.as_str(), s)).collect();

    let jobs: Vec<(usize, Vec<Sequence>)> = table
        .clusters()
        .iter()
        .filter(|c| c.size() >= min_size.max(1))
        .map(|c| {
            let members = c
                .members
                .iter()
                .map(|id| {
                    by_id.get(id.as_str()).map(|s| (*s).clone()).ok_or_else(|| {
                        AzulejoError::InvalidInput(format!(
                            "cluster {} member {} has no sequence",
                            c.id, id
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((c.id, members))
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Aligning {} of {} clusters with {}",
        jobs.len(),
        table.n_clusters(),
        aligner.name()
    );

    jobs.par_iter()
        .map(|(cluster, members)| {
            let output = out_dir.join(format!("{}.faa", cluster));
            debug!("Aligning cluster {} ({} sequences)", cluster, members.len());
            aligner.align(members, &output)?;
            Ok(output)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::fasta::parse_fasta;
    use crate::tools::testing::MockAligner;
    use tempfile::TempDir;

    #[test]
    fn test_align_clusters_skips_singletons() {
        let dir = TempDir::new().unwrap();
        let sequences = vec![
            Sequence::new("a".to_string(), b"MKV".to_vec()),
            Sequence::new("b".to_string(), b"MK".to_vec()),
            Sequence::new("c".to_string(), b"W".to_vec()),
        ];
        let table = ClusterTable::from_groups(
            0.9,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string()],
            ],
            &HashMap::new(),
        )
        .unwrap();

        let written = align_clusters(&MockAligner, &table, &sequences, dir.path(), 2).unwrap();
        assert_eq!(written, vec![dir.path().join("0.faa")]);

        let aligned = parse_fasta(&written[0]).unwrap();
        assert_eq!(aligned.len(), 2);
        assert!(aligned.iter().all(|s| s.len() == 3));
        assert!(!dir.path().join("1.faa").exists());
    }

    #[test]
    fn test_missing_sequence_rejected() {
        let dir = TempDir::new().unwrap();
        let table = ClusterTable::from_groups(
            0.9,
            vec![vec!["a".to_string(), "ghost".to_string()]],
            &HashMap::new(),
        )
        .unwrap();
        let sequences = vec![Sequence::new("a".to_string(), b"M".to_vec())];
        assert!(align_clusters(&MockAligner, &table, &sequences, dir.path(), 2).is_err());
    }
}
