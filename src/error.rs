//! Custom error types for rustlinkage.
//!
//! The matching core (normalization, filtering, dedup, blocking, evaluation) is total and
//! never fails. Errors only arise at the boundary: reading CSV files, validating their
//! schema, and loading configuration.

use crate::records::Source;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rustlinkage operations.
#[derive(Debug, Error)]
pub enum LinkageError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required column is absent from a tabular input
    #[error("Schema error: {} is missing required column '{column}'", path.display())]
    Schema {
        /// File that was being read
        path: PathBuf,
        /// Name of the missing column
        column: String,
    },

    /// The same id occurs twice within one source
    #[error("Duplicate id '{id}' in {dataset} records")]
    DuplicateId {
        /// Source the id belongs to
        dataset: Source,
        /// The repeated id
        id: String,
    },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `LinkageError`
pub type Result<T> = std::result::Result<T, LinkageError>;
