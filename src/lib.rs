pub mod bio;
pub mod cli;
pub mod core;
pub mod storage;
pub mod tools;

pub use crate::core::{
    annotate_homology, build_clusters, compare_clusters, map_synteny, refine_in_steps, Config,
};
pub use crate::storage::table::{read_table, write_table, Table};

use std::path::PathBuf;
use thiserror::Error;

pub const NAME: &str = "azulejo";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Error, Debug)]
pub enum AzulejoError {
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Unrecognized format: {0}")]
    UnrecognizedFormat(String),

    #[error("Clustering tool error: {0}")]
    ClusteringTool(String),

    #[error("Alignment tool error: {0}")]
    AlignmentTool(String),

    #[error("Synteny tool error: {0}")]
    SyntenyTool(String),

    #[error("Degenerate input: {0}")]
    Degenerate(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Table error: {0}")]
    Table(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AzulejoError>;

impl From<arrow::error::ArrowError> for AzulejoError {
    fn from(err: arrow::error::ArrowError) -> Self {
        AzulejoError::Table(err.to_string())
    }
}

impl From<parquet::errors::ParquetError> for AzulejoError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        AzulejoError::Table(err.to_string())
    }
}

impl From<csv::Error> for AzulejoError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            if let csv::ErrorKind::Io(io) = err.into_kind() {
                return AzulejoError::Io(io);
            }
            return AzulejoError::Table("csv I/O error".to_string());
        }
        AzulejoError::Table(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let missing = AzulejoError::InputNotFound(PathBuf::from("/no/such/file.faa"));
        assert_eq!(missing.to_string(), "Input not found: /no/such/file.faa");

        let format = AzulejoError::UnrecognizedFormat("xlsx".to_string());
        assert_eq!(format.to_string(), "Unrecognized format: xlsx");

        let tool = AzulejoError::ClusteringTool("usearch exited with 3".to_string());
        assert!(tool.to_string().starts_with("Clustering tool error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let err: AzulejoError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        match err {
            AzulejoError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            _ => panic!("Expected Io error variant"),
        }
    }
}
