//! Output naming conventions shared by pipeline stages.
//!
//! Each stage writes `<stem><suffix>.<ext>` next to its input so later stages
//! can find prior outputs without being told where they are.
use crate::storage::TableFormat;
use crate::{AzulejoError, Result};
use std::path::{Path, PathBuf};

pub const STATS_SUFFIX: &str = "-azulejo_stats";
pub const ANY_IDS_SUFFIX: &str = "-azulejo_ids-any";
pub const ALL_IDS_SUFFIX: &str = "-azulejo_ids-all";
pub const CLUSTERS_SUFFIX: &str = "-azulejo_clusts";
pub const PROXY_SUFFIX: &str = "-azulejo_proxies";
pub const FRAGMENTS_SUFFIX: &str = "-azulejo_fragments";
pub const HISTOGRAM_SUFFIX: &str = "-azulejo_hist";
pub const ANNOTATED_SUFFIX: &str = "-azulejo_homology";
pub const LINEAGE_SUFFIX: &str = "-azulejo_lineage";
pub const COMPARISON_SUFFIX: &str = "-azulejo_compare";

pub const PROTEOMES_TABLE: &str = "proteomes";
pub const PROTEINS_TABLE: &str = "proteins";
pub const COMBINED_FASTA: &str = "proteins.faa";

/// `<dir>/<stem><suffix>.<ext>`
pub fn output_path(dir: &Path, stem: &str, suffix: &str, format: TableFormat) -> PathBuf {
    dir.join(format!("{}{}.{}", stem, suffix, format.extension()))
}

/// `<dir>/<name>.<ext>`
pub fn table_path(dir: &Path, name: &str, format: TableFormat) -> PathBuf {
    dir.join(format!("{}.{}", name, format.extension()))
}

/// Per-step cluster table of the incremental refiner.
pub fn step_path(
    dir: &Path,
    stem: &str,
    step: usize,
    identity: f64,
    format: TableFormat,
) -> PathBuf {
    dir.join(format!(
        "{}-step{}-id{}{}.{}",
        stem,
        step,
        identity,
        CLUSTERS_SUFFIX,
        format.extension()
    ))
}

/// File stem without any compression extension (`a.faa.gz` gives `a`).
pub fn stem_of(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("azulejo");
    let name = name.strip_suffix(".gz").unwrap_or(name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

/// Read a list of paths, one per line, resolving relative entries against
/// the list file's directory. Every listed path must exist.
pub fn get_paths_from_file<P: AsRef<Path>>(list: P) -> Result<Vec<PathBuf>> {
    let list = list.as_ref();
    if !list.exists() {
        return Err(AzulejoError::InputNotFound(list.to_path_buf()));
    }
    let base = list.parent().unwrap_or_else(|| Path::new("."));
    let contents = std::fs::read_to_string(list)?;

    let mut paths = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let path = Path::new(line);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        if !path.exists() {
            return Err(AzulejoError::InputNotFound(path));
        }
        paths.push(path);
    }
    Ok(paths)
}
