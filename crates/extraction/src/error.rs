//! Error types for the extraction crate.

use std::path::PathBuf;

use cams_common::{Regime, TimeParseError};
use thiserror::Error;

/// Errors that can occur during extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Scan root does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Failed to parse timestamp from {}: {source}", .path.display())]
    TimestampParse {
        path: PathBuf,
        #[source]
        source: TimeParseError,
    },

    #[error("Failed to read product {}: {reason}", .path.display())]
    ProductRead { path: PathBuf, reason: String },

    #[error("No usable observations: all {failed} discovered products failed")]
    NoUsableObservations { failed: usize },

    #[error("Failed to write artifact {}: {reason}", .path.display())]
    ArtifactWrite { path: PathBuf, reason: String },

    #[error("Series lacks {regime} species: {}", .missing.join(", "))]
    MissingSpecies { regime: Regime, missing: Vec<String> },

    #[error("Malformed series: {0}")]
    InvalidSeries(String),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not a site-series artifact name: {}", .0.display())]
    UnknownArtifact(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker task failed: {0}")]
    Task(String),
}

impl ExtractionError {
    /// Whether this error only affects a single product.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            ExtractionError::TimestampParse { .. } | ExtractionError::ProductRead { .. }
        )
    }

    pub(crate) fn product_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ExtractionError::ProductRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for ExtractionError {
    fn from(err: tokio::task::JoinError) -> Self {
        ExtractionError::Task(err.to_string())
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
