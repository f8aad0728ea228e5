//! In-process stand-ins for external tools, for tests and dry runs
use super::traits::{Aligner, Clusterer, MembershipRecord};
use crate::bio::fasta::write_fasta;
use crate::bio::sequence::Sequence;
use crate::{AzulejoError, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Greedy clusterer with usearch-like output.
///
/// Sequences are visited longest first (ties by id). Each joins the first
/// centroid it matches at the requested identity, where identity is the
/// fraction of identical aligned positions over the longer of the two
/// lengths, with no gaps. Otherwise it founds a new cluster.
#[derive(Debug, Default)]
pub struct MockClusterer {
    /// Report sequences that found no partner as `N` records instead of
    /// single-member clusters.
    pub report_unclustered: bool,
    /// Fail every call with a clustering-tool error.
    pub fail: bool,
    calls: AtomicUsize,
}

impl MockClusterer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reporting_unclustered() -> Self {
        Self {
            report_unclustered: true,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

pub fn identity(a: &[u8], b: &[u8]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let same = a
        .iter()
        .zip(b)
        .filter(|(x, y)| x.eq_ignore_ascii_case(y))
        .count();
    same as f64 / longest as f64
}

impl Clusterer for MockClusterer {
    fn cluster(&self, sequences: &[Sequence], threshold: f64) -> Result<Vec<MembershipRecord>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(AzulejoError::ClusteringTool(
                "mock clusterer told to fail".to_string(),
            ));
        }

        let mut order: Vec<&Sequence> = sequences.iter().collect();
        order.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.id.cmp(&b.id)));

        let mut centroids: Vec<&Sequence> = Vec::new();
        let mut assignment: Vec<(usize, bool)> = Vec::with_capacity(order.len());
        for seq in &order {
            let hit = centroids
                .iter()
                .position(|c| identity(&c.sequence, &seq.sequence) >= threshold);
            match hit {
                Some(cluster) => assignment.push((cluster, false)),
                None => {
                    centroids.push(*seq);
                    assignment.push((centroids.len() - 1, true));
                }
            }
        }

        let mut sizes = vec![0usize; centroids.len()];
        for (cluster, _) in &assignment {
            sizes[*cluster] += 1;
        }

        let records = order
            .iter()
            .zip(assignment)
            .map(|(seq, (cluster, founder))| {
                let id = seq.id.clone();
                if self.report_unclustered && sizes[cluster] == 1 {
                    MembershipRecord::Unclustered { id }
                } else if founder {
                    MembershipRecord::Centroid { id, cluster }
                } else {
                    MembershipRecord::Hit { id, cluster }
                }
            })
            .collect();
        Ok(records)
    }

    fn verify_installation(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Aligner that pads every sequence with '-' to the longest length.
#[derive(Debug, Default)]
pub struct MockAligner;

impl Aligner for MockAligner {
    fn align(&self, sequences: &[Sequence], output: &Path) -> Result<()> {
        let width = sequences.iter().map(Sequence::len).max().unwrap_or(0);
        let padded: Vec<Sequence> = sequences
            .iter()
            .map(|s| {
                let mut residues = s.sequence.clone();
                residues.resize(width, b'-');
                Sequence::new(s.id.clone(), residues)
            })
            .collect();
        write_fasta(output, &padded)
    }

    fn verify_installation(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(id: &str, residues: &str) -> Sequence {
        Sequence::new(id.to_string(), residues.as_bytes().to_vec())
    }

    #[test]
    fn test_identity() {
        assert_eq!(identity(b"MKVL", b"MKVL"), 1.0);
        assert_eq!(identity(b"MKVL", b"MKVA"), 0.75);
        assert_eq!(identity(b"MKVL", b"MK"), 0.5);
    }

    #[test]
    fn test_identical_sequences_share_a_cluster() {
        let seqs = vec![
            seq("a", "MKVLA"),
            seq("b", "MKVLA"),
            seq("c", "MKVLA"),
            seq("d", "WWWWW"),
        ];
        let records = MockClusterer::new().cluster(&seqs, 1.0).unwrap();
        let centroids = records
            .iter()
            .filter(|r| matches!(r, MembershipRecord::Centroid { .. }))
            .count();
        assert_eq!(records.len(), 4);
        assert_eq!(centroids, 2);
    }

    #[test]
    fn test_report_unclustered() {
        let seqs = vec![seq("a", "MKV"), seq("b", "WWW")];
        let records = MockClusterer::reporting_unclustered()
            .cluster(&seqs, 1.0)
            .unwrap();
        assert!(records
            .iter()
            .all(|r| matches!(r, MembershipRecord::Unclustered { .. })));
    }
}
