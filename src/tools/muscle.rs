//! MUSCLE multiple-sequence alignment wrapper
use super::traits::Aligner;
use crate::bio::fasta::write_fasta;
use crate::bio::sequence::Sequence;
use crate::{AzulejoError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

pub struct MuscleAligner {
    binary_path: PathBuf,
}

impl MuscleAligner {
    pub fn new<P: AsRef<Path>>(binary_path: P) -> Self {
        Self {
            binary_path: binary_path.as_ref().to_path_buf(),
        }
    }
}

impl Aligner for MuscleAligner {
    fn align(&self, sequences: &[Sequence], output: &Path) -> Result<()> {
        let scratch = tempfile::Builder::new()
            .prefix("azulejo-muscle-")
            .tempdir()?;
        let input = scratch.path().join("cluster.faa");
        write_fasta(&input, sequences)?;

        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-in").arg(&input).arg("-out").arg(output).arg("-quiet");
        debug!("Running command: {:?}", cmd);

        let result = cmd.output().map_err(|e| {
            AzulejoError::AlignmentTool(format!(
                "failed to run {}: {}",
                self.binary_path.display(),
                e
            ))
        })?;
        if !result.status.success() {
            return Err(AzulejoError::AlignmentTool(format!(
                "{} exited with {}: {}",
                self.binary_path.display(),
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }
        if !output.exists() {
            return Err(AzulejoError::AlignmentTool(format!(
                "{} wrote no alignment to {}",
                self.binary_path.display(),
                output.display()
            )));
        }
        Ok(())
    }

    fn verify_installation(&self) -> Result<()> {
        let output = Command::new(&self.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| {
                AzulejoError::AlignmentTool(format!(
                    "{} is not runnable: {}",
                    self.binary_path.display(),
                    e
                ))
            })?;
        if !output.status.success() {
            return Err(AzulejoError::AlignmentTool(format!(
                "{} -version exited with {}",
                self.binary_path.display(),
                output.status
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "muscle"
    }
}
