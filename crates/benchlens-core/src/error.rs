//! Error types for benchlens-core.
//!
//! [`AnalysisError`] is what callers of the engine see. Validation variants
//! are raised before any retrieval and name the offending value;
//! [`AnalysisError::DataSourceUnavailable`] is normally folded into the
//! affected benchmark's entry rather than failing a whole report.
//!
//! [`StoreError`] is produced by score-source backends.

use crate::types::BenchmarkId;
use thiserror::Error;

/// Errors raised while validating or executing an analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Benchmark id not present in the registry
    #[error("Unknown benchmark: {0}")]
    InvalidBenchmark(String),
    /// Request named no models
    #[error("At least one model must be specified")]
    EmptyModelSet,
    /// Request named no benchmarks
    #[error("At least one benchmark must be specified")]
    EmptyBenchmarkSet,
    /// Model id not in the registry's closed model set
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    /// Grouping column not registered for the benchmark
    #[error("Unknown metadata column '{column}' for benchmark '{benchmark}'")]
    UnknownMetadataColumn { benchmark: String, column: String },
    /// Retrieval from the score source failed
    #[error("Data source unavailable for benchmark '{benchmark}': {reason}")]
    DataSourceUnavailable { benchmark: String, reason: String },
}

impl AnalysisError {
    /// True for errors detected before retrieval.
    pub fn is_validation(&self) -> bool {
        !matches!(self, AnalysisError::DataSourceUnavailable { .. })
    }

    pub(crate) fn unavailable(benchmark: &BenchmarkId, err: impl std::fmt::Display) -> Self {
        AnalysisError::DataSourceUnavailable {
            benchmark: benchmark.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Errors that can occur inside a score-source backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The benchmark's table does not exist in the store
    #[error("Table not found: {0}")]
    TableMissing(String),

    /// I/O error (filesystem, import files)
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Row rejected before it was written
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// Database error (redb)
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializationError(err.to_string())
    }
}
