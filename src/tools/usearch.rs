//! USEARCH greedy clustering wrapper
//!
//! Runs `usearch -cluster_fast` in a scratch directory and reads its UC
//! membership file.
use super::traits::{Clusterer, MembershipRecord};
use crate::bio::fasta::write_fasta;
use crate::bio::sequence::Sequence;
use crate::{AzulejoError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

pub struct UsearchClusterer {
    binary_path: PathBuf,
    extra_args: Vec<String>,
}

impl UsearchClusterer {
    pub fn new<P: AsRef<Path>>(binary_path: P) -> Self {
        Self {
            binary_path: binary_path.as_ref().to_path_buf(),
            extra_args: Vec::new(),
        }
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

impl Clusterer for UsearchClusterer {
    fn cluster(&self, sequences: &[Sequence], identity: f64) -> Result<Vec<MembershipRecord>> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let scratch = tempfile::Builder::new()
            .prefix("azulejo-usearch-")
            .tempdir()?;
        let input = scratch.path().join("input.faa");
        let uc_path = scratch.path().join("clusters.uc");
        // Headers carry the bare id so UC labels match exactly.
        let bare: Vec<Sequence> = sequences
            .iter()
            .map(|s| Sequence::new(s.id.clone(), s.sequence.clone()))
            .collect();
        write_fasta(&input, &bare)?;

        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-cluster_fast")
            .arg(&input)
            .arg("-id")
            .arg(identity.to_string())
            .arg("-sort")
            .arg("length")
            .arg("-uc")
            .arg(&uc_path)
            .args(&self.extra_args);
        debug!("Running command: {:?}", cmd);

        let output = cmd.output().map_err(|e| {
            AzulejoError::ClusteringTool(format!(
                "failed to run {}: {}",
                self.binary_path.display(),
                e
            ))
        })?;
        if !output.status.success() {
            return Err(AzulejoError::ClusteringTool(format!(
                "{} exited with {}: {}",
                self.binary_path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let uc = std::fs::read_to_string(&uc_path).map_err(|e| {
            AzulejoError::ClusteringTool(format!("no UC output at {}: {}", uc_path.display(), e))
        })?;
        let records = parse_uc(&uc)?;
        info!(
            "{} clustered {} sequences at identity {}",
            self.name(),
            sequences.len(),
            identity
        );
        Ok(records)
    }

    fn verify_installation(&self) -> Result<()> {
        let status = Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .map_err(|e| {
                AzulejoError::ClusteringTool(format!(
                    "{} is not runnable: {}",
                    self.binary_path.display(),
                    e
                ))
            })?
            .status;
        if !status.success() {
            return Err(AzulejoError::ClusteringTool(format!(
                "{} --version exited with {}",
                self.binary_path.display(),
                status
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "usearch"
    }
}

/// Parse UC records.
///
/// Each line holds ten tab-separated fields; the first is the record type,
/// the second the cluster number and the ninth the query label. `C` cluster
/// summaries carry no membership and are skipped.
pub fn parse_uc(text: &str) -> Result<Vec<MembershipRecord>> {
    let mut records = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 {
            return Err(AzulejoError::ClusteringTool(format!(
                "UC line {} has {} fields, expected 10",
                lineno + 1,
                fields.len()
            )));
        }
        let label = fields[8].split_whitespace().next().unwrap_or("");
        if label.is_empty() || label == "*" {
            return Err(AzulejoError::ClusteringTool(format!(
                "UC line {} has no query label",
                lineno + 1
            )));
        }
        let cluster = || {
            fields[1].parse::<usize>().map_err(|_| {
                AzulejoError::ClusteringTool(format!(
                    "UC line {} has bad cluster number '{}'",
                    lineno + 1,
                    fields[1]
                ))
            })
        };
        let record = match fields[0] {
            "S" => MembershipRecord::Centroid {
                id: label.to_string(),
                cluster: cluster()?,
            },
            "H" => MembershipRecord::Hit {
                id: label.to_string(),
                cluster: cluster()?,
            },
            "N" => MembershipRecord::Unclustered {
                id: label.to_string(),
            },
            "C" => continue,
            other => {
                return Err(AzulejoError::ClusteringTool(format!(
                    "UC line {} has unknown record type '{}'",
                    lineno + 1,
                    other
                )))
            }
        };
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const UC: &str = "S\t0\t120\t*\t*\t*\t*\t*\tp1\t*\n\
                      H\t0\t118\t99.2\t+\t0\t0\t118M\tp2\tp1\n\
                      S\t1\t80\t*\t*\t*\t*\t*\tp3\t*\n\
                      N\t*\t60\t*\t*\t*\t*\t*\tp4\t*\n\
                      C\t0\t2\t99.2\t*\t*\t*\t*\tp1\t*\n";

    #[test]
    fn test_parse_uc() {
        let records = parse_uc(UC).unwrap();
        assert_eq!(
            records,
            vec![
                MembershipRecord::Centroid { id: "p1".to_string(), cluster: 0 },
                MembershipRecord::Hit { id: "p2".to_string(), cluster: 0 },
                MembershipRecord::Centroid { id: "p3".to_string(), cluster: 1 },
                MembershipRecord::Unclustered { id: "p4".to_string() },
            ]
        );
    }

    #[test]
    fn test_parse_uc_rejects_garbage() {
        assert!(matches!(
            parse_uc("this is not uc\n"),
            Err(AzulejoError::ClusteringTool(_))
        ));
        assert!(matches!(
            parse_uc("X\t0\t1\t*\t*\t*\t*\t*\tp1\t*\n"),
            Err(AzulejoError::ClusteringTool(_))
        ));
    }

    #[test]
    fn test_missing_binary() {
        let clusterer = UsearchClusterer::new("/no/such/usearch");
        let seqs = vec![Sequence::new("a".to_string(), b"MKV".to_vec())];
        let err = clusterer.cluster(&seqs, 0.9).unwrap_err();
        assert!(matches!(err, AzulejoError::ClusteringTool(_)));
    }
}
