//! Score sources: the read-only data stores the analysis engine consumes.
//!
//! A [`ScoreSource`] answers a [`QuerySpec`] with aggregated
//! [`GroupedScoreRow`]s and can list the raw match scores of one table for
//! the global overview. The engine never writes through this trait.
//!
//! # Implementations
//!
//! - [`InMemoryScoreSource`] - tables held in memory; used by tests and for
//!   ad-hoc analysis of already-loaded rows
//! - [`RedbScoreStore`] - one redb table per benchmark table (desktop/CLI)

mod memory;

#[cfg(feature = "redb-store")]
mod redb_store;

pub use memory::InMemoryScoreSource;

#[cfg(feature = "redb-store")]
pub use redb_store::RedbScoreStore;

pub use crate::error::StoreError;

use crate::query::QuerySpec;
use crate::types::{GroupedScoreRow, ModelId};

/// One raw match score, as scanned for the data overview.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSample {
    pub model: ModelId,
    pub match_score: f64,
}

/// Read-only access to per-benchmark evaluation tables.
///
/// Implementations must be shareable across threads: the engine may query
/// several benchmarks concurrently against the same source.
pub trait ScoreSource: Send + Sync {
    /// Executes `spec` and returns one row per (metadata key, model), or per
    /// model when the spec has no grouping columns, ordered as
    /// [`QuerySpec::evaluate`] orders them.
    ///
    /// Returns [`StoreError::TableMissing`] if `spec.table` does not exist.
    fn fetch(&self, spec: &QuerySpec) -> Result<Vec<GroupedScoreRow>, StoreError>;

    /// Returns every match score stored in `table`.
    ///
    /// Returns [`StoreError::TableMissing`] if the table does not exist.
    fn scan_scores(&self, table: &str) -> Result<Vec<ScoreSample>, StoreError>;
}
