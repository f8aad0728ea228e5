use crate::storage::{Codec, TableFormat};
use crate::AzulejoError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Escalate degenerate-input warnings to errors.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub homology: HomologyConfig,
    #[serde(default)]
    pub synteny: SyntenyConfig,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleOrder {
    #[default]
    Descending,
    Ascending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_clusterer")]
    pub binary: String,
    #[serde(default = "default_schedule")]
    pub schedule: Vec<f64>,
    #[serde(default)]
    pub order: ScheduleOrder,
    /// Passed verbatim to the clusterer after the standard arguments.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomologyConfig {
    /// Clusters of at most this many members are "small"; larger are "large".
    #[serde(default = "default_small_cluster_max")]
    pub small_cluster_max: usize,
    /// Lengths more than this many median absolute deviations from the
    /// median are outliers.
    #[serde(default = "default_outlier_mads")]
    pub outlier_mads: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    #[default]
    Native,
    Dagchainer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntenyConfig {
    #[serde(default = "default_max_gap")]
    pub max_gap: u32,
    #[serde(default = "default_min_block_len")]
    pub min_block_len: usize,
    /// Also scan each proteome against itself for tandem duplicates.
    #[serde(default)]
    pub self_synteny: bool,
    #[serde(default)]
    pub detector: DetectorKind,
    #[serde(default = "default_dagchainer")]
    pub dagchainer_binary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    #[serde(default = "default_aligner")]
    pub binary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: TableFormat,
    #[serde(default)]
    pub codec: Codec,
}

fn default_clusterer() -> String {
    "usearch".to_string()
}

fn default_schedule() -> Vec<f64> {
    vec![1.0, 0.95, 0.9, 0.85, 0.8]
}

fn default_small_cluster_max() -> usize {
    8
}

fn default_outlier_mads() -> f64 {
    3.0
}

fn default_max_gap() -> u32 {
    2
}

fn default_min_block_len() -> usize {
    2
}

fn default_dagchainer() -> String {
    "dagchainer".to_string()
}

fn default_aligner() -> String {
    "muscle".to_string()
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            binary: default_clusterer(),
            schedule: default_schedule(),
            order: ScheduleOrder::default(),
            extra_args: Vec::new(),
        }
    }
}

impl Default for HomologyConfig {
    fn default() -> Self {
        Self {
            small_cluster_max: default_small_cluster_max(),
            outlier_mads: default_outlier_mads(),
        }
    }
}

impl Default for SyntenyConfig {
    fn default() -> Self {
        Self {
            max_gap: default_max_gap(),
            min_block_len: default_min_block_len(),
            self_synteny: false,
            detector: DetectorKind::default(),
            dagchainer_binary: default_dagchainer(),
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            binary: default_aligner(),
        }
    }
}

impl Config {
    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<(), AzulejoError> {
        if self.clustering.schedule.is_empty() {
            return Err(AzulejoError::Config(
                "clustering.schedule must not be empty".to_string(),
            ));
        }
        if let Some(bad) = self
            .clustering
            .schedule
            .iter()
            .find(|&&id| !(id > 0.0 && id <= 1.0))
        {
            return Err(AzulejoError::Config(format!(
                "identity {} is outside (0, 1]",
                bad
            )));
        }
        if self.synteny.max_gap == 0 {
            return Err(AzulejoError::Config(
                "synteny.max_gap must be at least 1".to_string(),
            ));
        }
        if self.synteny.min_block_len < 2 {
            return Err(AzulejoError::Config(
                "synteny.min_block_len must be at least 2".to_string(),
            ));
        }
        if !(self.homology.outlier_mads > 0.0) {
            return Err(AzulejoError::Config(
                "homology.outlier_mads must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, AzulejoError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AzulejoError::InputNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| AzulejoError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), AzulejoError> {
    let contents = to_toml(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn to_toml(config: &Config) -> Result<String, AzulejoError> {
    toml::to_string_pretty(config)
        .map_err(|e| AzulejoError::Config(format!("Failed to serialize config: {}", e)))
}
