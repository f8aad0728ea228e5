//! DAGchainer colinearity detection wrapper
//!
//! Anchors are written in DAGchainer's match-list layout:
//!
//! ```text
//! chrA  accA  startA  endA  chrB  accB  startB  endB  evalue
//! ```
//!
//! and chains are read back from `.aligncoords` output, where each chain
//! opens with a `##` header line (containing `reverse` for inverted chains)
//! followed by its member pairs in match-list layout.
use super::traits::{Anchor, Chain, ColinearityDetector, Direction};
use crate::{AzulejoError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

pub struct DagChainer {
    binary_path: PathBuf,
}

impl DagChainer {
    pub fn new<P: AsRef<Path>>(binary_path: P) -> Self {
        Self {
            binary_path: binary_path.as_ref().to_path_buf(),
        }
    }
}

impl ColinearityDetector for DagChainer {
    fn chain(&self, anchors: &[Anchor], max_gap: u32, min_len: usize) -> Result<Vec<Chain>> {
        if anchors.is_empty() {
            return Ok(Vec::new());
        }

        let scratch = tempfile::Builder::new()
            .prefix("azulejo-dagchainer-")
            .tempdir()?;
        let input = scratch.path().join("anchors.tsv");
        std::fs::write(&input, format_anchors(anchors))?;

        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-i")
            .arg(&input)
            .arg("-g")
            .arg("1")
            .arg("-D")
            .arg(max_gap.to_string())
            .arg("-A")
            .arg(min_len.to_string());
        debug!("Running command: {:?}", cmd);

        let output = cmd.output().map_err(|e| {
            AzulejoError::SyntenyTool(format!(
                "failed to run {}: {}",
                self.binary_path.display(),
                e
            ))
        })?;
        if !output.status.success() {
            return Err(AzulejoError::SyntenyTool(format!(
                "{} exited with {}: {}",
                self.binary_path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let coords_file = scratch.path().join("anchors.tsv.aligncoords");
        let text = if coords_file.exists() {
            std::fs::read_to_string(&coords_file)?
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        let chains = parse_aligncoords(&text, anchors)?;
        Ok(chains.into_iter().filter(|c| c.anchors.len() >= min_len).collect())
    }

    fn name(&self) -> &str {
        "dagchainer"
    }
}

fn format_anchors(anchors: &[Anchor]) -> String {
    anchors
        .iter()
        .map(|a| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t1e-50\n",
                a.a_frag, a.a_id, a.a_pos, a.a_pos, a.b_frag, a.b_id, a.b_pos, a.b_pos
            )
        })
        .collect()
}

/// Map `.aligncoords` text back onto anchor indices.
pub fn parse_aligncoords(text: &str, anchors: &[Anchor]) -> Result<Vec<Chain>> {
    let lookup: HashMap<(&str, &str), usize> = anchors
        .iter()
        .enumerate()
        .map(|(i, a)| ((a.a_id.as_str(), a.b_id.as_str()), i))
        .collect();

    let mut chains: Vec<Chain> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("##") {
            let direction = if line.contains("reverse") {
                Direction::Reverse
            } else {
                Direction::Forward
            };
            chains.push(Chain {
                anchors: Vec::new(),
                direction,
            });
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 8 {
            return Err(AzulejoError::SyntenyTool(format!(
                "aligncoords line {} has {} fields",
                lineno + 1,
                fields.len()
            )));
        }
        let index = lookup.get(&(fields[1], fields[5])).ok_or_else(|| {
            AzulejoError::SyntenyTool(format!(
                "aligncoords line {} names unknown pair {} / {}",
                lineno + 1,
                fields[1],
                fields[5]
            ))
        })?;
        match chains.last_mut() {
            Some(chain) => chain.anchors.push(*index),
            None => {
                return Err(AzulejoError::SyntenyTool(format!(
                    "aligncoords line {} precedes any chain header",
                    lineno + 1
                )))
            }
        }
    }

    for chain in &mut chains {
        chain.anchors.sort_by_key(|&i| (anchors[i].a_pos, i));
        chain.anchors.dedup();
    }
    Ok(chains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn anchor(a: &str, b: &str, pa: i64, pb: i64) -> Anchor {
        Anchor {
            a_id: a.to_string(),
            b_id: b.to_string(),
            a_frag: "chr1".to_string(),
            b_frag: "chr1".to_string(),
            a_pos: pa,
            b_pos: pb,
            cluster: 0,
        }
    }

    #[test]
    fn test_parse_aligncoords() {
        let anchors = vec![
            anchor("a1", "b1", 1, 1),
            anchor("a2", "b2", 2, 2),
            anchor("a3", "b9", 3, 9),
            anchor("a4", "b8", 4, 8),
        ];
        let text = "## alignment chr1 vs. chr1 Alignment #1  score = 100.0 n = 2\n\
                    chr1\ta2\t2\t2\tchr1\tb2\t2\t2\t1e-50\t50.0\n\
                    chr1\ta1\t1\t1\tchr1\tb1\t1\t1\t1e-50\t50.0\n\
                    ## alignment chr1 vs. chr1 (reverse) Alignment #2  score = 100.0 n = 2\n\
                    chr1\ta3\t3\t3\tchr1\tb9\t9\t9\t1e-50\t50.0\n\
                    chr1\ta4\t4\t4\tchr1\tb8\t8\t8\t1e-50\t50.0\n";
        let chains = parse_aligncoords(text, &anchors).unwrap();
        assert_eq!(
            chains,
            vec![
                Chain { anchors: vec![0, 1], direction: Direction::Forward },
                Chain { anchors: vec![2, 3], direction: Direction::Reverse },
            ]
        );
    }

    #[test]
    fn test_anchors_written_as_match_list() {
        let anchors = vec![anchor("a1", "b1", 1, 5), anchor("a2", "b2", 2, 6)];
        let text = format_anchors(&anchors);
        assert_eq!(
            text,
            "chr1\ta1\t1\t1\tchr1\tb1\t5\t5\t1e-50\n\
             chr1\ta2\t2\t2\tchr1\tb2\t6\t6\t1e-50\n"
        );
        let chains = parse_aligncoords(&format!("##\n{}", text), &anchors).unwrap();
        assert_eq!(chains[0].anchors, vec![0, 1]);
    }

    #[test]
    fn test_unknown_pair_is_an_error() {
        let anchors = vec![anchor("a1", "b1", 1, 1)];
        let text = "## alignment\nchr1\tzz\t1\t1\tchr1\tb1\t1\t1\t1e-50\n";
        assert!(matches!(
            parse_aligncoords(text, &anchors),
            Err(AzulejoError::SyntenyTool(_))
        ));
    }
}
