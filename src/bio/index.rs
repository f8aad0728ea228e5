//! Record-level index of FASTA files over a memory map.
//!
//! Nothing here parses residues: records are located by a `>` byte at the
//! start of a line, which makes counting, trimming and splitting of very large
//! inputs cheap.
use crate::storage::TrimmableMap;
use crate::{AzulejoError, Result};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaIndex {
    pub path: PathBuf,
    /// Byte offset of every record's '>'.
    pub offsets: Vec<usize>,
    /// File size at the time the index was built.
    pub total_bytes: usize,
}

impl FastaIndex {
    pub fn records(&self) -> usize {
        self.offsets.len()
    }

    /// Byte range of record `i`, including its header line.
    pub fn record_range(&self, i: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(i)?;
        let end = self.offsets.get(i + 1).copied().unwrap_or(self.total_bytes);
        Some(start..end)
    }
}

/// Offsets of every '>' that begins a line.
pub fn record_offsets(data: &[u8]) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut at_line_start = true;
    for (pos, &byte) in data.iter().enumerate() {
        if at_line_start && byte == b'>' {
            offsets.push(pos);
        }
        at_line_start = byte == b'\n';
    }
    offsets
}

/// Count the records of a FASTA file without loading it.
pub fn fasta_records<P: AsRef<Path>>(path: P) -> Result<FastaIndex> {
    let path = path.as_ref();
    let map = TrimmableMap::open(path)?;
    let index = FastaIndex {
        path: path.to_path_buf(),
        offsets: record_offsets(map.as_bytes()),
        total_bytes: map.len(),
    };
    map.close()?;
    Ok(index)
}

/// Truncate a FASTA file in place so that only its first `keep` records remain.
///
/// Returns the index of the file as it was before trimming.
pub fn trim_fasta<P: AsRef<Path>>(path: P, keep: usize) -> Result<FastaIndex> {
    let path = path.as_ref();
    let mut map = TrimmableMap::open_writable(path)?;
    let index = FastaIndex {
        path: path.to_path_buf(),
        offsets: record_offsets(map.as_bytes()),
        total_bytes: map.len(),
    };
    if let Some(&cut) = index.offsets.get(keep) {
        map.trim(cut)?;
        info!(
            "Trimmed {} from {} to {} records ({} bytes)",
            path.display(),
            index.records(),
            keep,
            cut
        );
    }
    map.close()?;
    Ok(index)
}

/// Split a FASTA file into chunks of at most `per_file` records.
///
/// Chunks are written to `out_dir` as `<stem>.<n>.<ext>`, numbered from 0.
pub fn split_fasta<P: AsRef<Path>, Q: AsRef<Path>>(
    path: P,
    per_file: usize,
    out_dir: Q,
) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let out_dir = out_dir.as_ref();
    if per_file == 0 {
        return Err(AzulejoError::InvalidInput(
            "records per file must be at least 1".to_string(),
        ));
    }

    let map = TrimmableMap::open(path)?;
    let data = map.as_bytes();
    let offsets = record_offsets(data);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("records");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("fa");

    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    for (n, chunk) in offsets.chunks(per_file).enumerate() {
        let start = chunk[0];
        let end = offsets
            .get((n + 1) * per_file)
            .copied()
            .unwrap_or(data.len());
        let out = out_dir.join(format!("{}.{}.{}", stem, n, ext));
        fs::write(&out, &data[start..end])?;
        written.push(out);
    }
    map.close()?;

    info!("Split {} into {} files", path.display(), written.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &[u8] = b">a desc with > inside\nMKV\n>b\nLL>A\n>c\nGG\n";

    fn sample_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_only_line_start_markers_count() {
        assert_eq!(record_offsets(SAMPLE), vec![0, 26, 34]);
    }

    #[test]
    fn test_fasta_records() {
        let file = sample_file();
        let index = fasta_records(file.path()).unwrap();
        assert_eq!(index.records(), 3);
        assert_eq!(index.total_bytes, SAMPLE.len());
        assert_eq!(index.record_range(2), Some(34..SAMPLE.len()));
        assert_eq!(index.record_range(3), None);
    }

    #[test]
    fn test_trim_fasta() {
        let file = sample_file();
        let before = trim_fasta(file.path(), 2).unwrap();
        assert_eq!(before.total_bytes, SAMPLE.len());
        assert_eq!(std::fs::read(file.path()).unwrap(), &SAMPLE[..34]);
        assert_eq!(fasta_records(file.path()).unwrap().records(), 2);
    }

    #[test]
    fn test_trim_beyond_end_is_noop() {
        let file = sample_file();
        trim_fasta(file.path(), 10).unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), SAMPLE);
    }

    #[test]
    fn test_split_fasta() {
        let file = sample_file();
        let dir = tempfile::tempdir().unwrap();
        let parts = split_fasta(file.path(), 2, dir.path()).unwrap();
        assert_eq!(parts.len(), 2);
        let first = std::fs::read(&parts[0]).unwrap();
        let second = std::fs::read(&parts[1]).unwrap();
        assert_eq!([first, second].concat(), SAMPLE);
    }
}
