//! Redb-backed score store for desktop platforms.
//!
//! Uses [redb](https://github.com/cberner/redb) - a pure Rust, ACID-compliant,
//! embedded B-tree database.
//!
//! # Tables
//!
//! One redb table per benchmark table, named after the registry entry's
//! `table` field (for example `aime_results`):
//!
//! - key: question id (u64), assigned on insert when the row has none
//! - value: [`RawScoreRow`] (JSON)
//!
//! Tables are created by [`RedbScoreStore::insert_rows`]. Querying a table
//! that was never written yields [`StoreError::TableMissing`].

use super::{ScoreSample, ScoreSource, StoreError};
use crate::query::QuerySpec;
use crate::types::{GroupedScoreRow, RawScoreRow};
use redb::{Database, ReadableTable, TableDefinition, TableError, TableHandle};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn table_def(name: &str) -> TableDefinition<'_, u64, &'static [u8]> {
    TableDefinition::new(name)
}

/// Redb-backed score store.
///
/// # Example
///
/// ```ignore
/// use benchlens_core::storage::RedbScoreStore;
///
/// let store = RedbScoreStore::open("./data/scores.redb")?;
/// store.insert_rows("aime_results", &rows)?;
/// ```
pub struct RedbScoreStore {
    db: Arc<Database>,
}

impl RedbScoreStore {
    /// Opens or creates a redb database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref())
            .map_err(|e| StoreError::DatabaseError(format!("Failed to open database: {}", e)))?;
        Ok(Self { db: Arc::new(db) })
    }

    fn serialize_row(row: &RawScoreRow) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(row)
            .map_err(|e| StoreError::SerializationError(format!("Failed to serialize row: {}", e)))
    }

    fn deserialize_row(bytes: &[u8]) -> Result<RawScoreRow, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| {
            StoreError::SerializationError(format!("Failed to deserialize row: {}", e))
        })
    }

    /// Appends rows to `table`, creating the table if needed.
    ///
    /// Rows with `question_id == 0` get the next free key; rows with an
    /// explicit id are stored under it, replacing any previous row with the
    /// same id. Returns the number of rows written.
    ///
    /// `u64::MAX` is not a valid id. A batch containing it fails with
    /// [`StoreError::InvalidRow`] and nothing from the batch is written.
    pub fn insert_rows(&self, table: &str, rows: &[RawScoreRow]) -> Result<usize, StoreError> {
        let write_txn = self.db.begin_write().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;

        {
            let mut t = write_txn.open_table(table_def(table)).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to open table {}: {}", table, e))
            })?;

            let mut next_id = t
                .last()
                .map_err(|e| StoreError::DatabaseError(format!("Failed to read last key: {}", e)))?
                .map(|(k, _)| k.value().saturating_add(1))
                .unwrap_or(1);

            for row in rows {
                let mut row = row.clone();
                if row.question_id == 0 {
                    row.question_id = next_id;
                }
                if row.question_id == u64::MAX {
                    return Err(StoreError::InvalidRow(format!(
                        "question id {} is out of range in table {}",
                        row.question_id, table
                    )));
                }
                next_id = next_id.max(row.question_id + 1);

                let bytes = Self::serialize_row(&row)?;
                t.insert(row.question_id, bytes.as_slice()).map_err(|e| {
                    StoreError::DatabaseError(format!("Failed to insert row: {}", e))
                })?;
            }
        }

        write_txn
            .commit()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to commit rows: {}", e)))?;

        debug!(table, rows = rows.len(), "Inserted score rows");
        Ok(rows.len())
    }

    /// Names of all tables in the database.
    pub fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;
        let tables = read_txn
            .list_tables()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to list tables: {}", e)))?;
        Ok(tables.map(|h| h.name().to_string()).collect())
    }

    /// Reads every row of `table` in key order.
    pub fn load_rows(&self, table: &str) -> Result<Vec<RawScoreRow>, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;

        let t = match read_txn.open_table(table_def(table)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => {
                return Err(StoreError::TableMissing(table.to_string()))
            }
            Err(e) => {
                return Err(StoreError::DatabaseError(format!(
                    "Failed to open table {}: {}",
                    table, e
                )))
            }
        };

        let iter = t
            .iter()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to iterate {}: {}", table, e)))?;

        let mut rows = Vec::new();
        for result in iter {
            let (_, value) = result.map_err(|e| {
                StoreError::DatabaseError(format!("Failed to read row from {}: {}", table, e))
            })?;
            rows.push(Self::deserialize_row(value.value())?);
        }

        Ok(rows)
    }
}

impl ScoreSource for RedbScoreStore {
    fn fetch(&self, spec: &QuerySpec) -> Result<Vec<GroupedScoreRow>, StoreError> {
        let rows = self.load_rows(&spec.table)?;
        Ok(spec.evaluate(&rows))
    }

    fn scan_scores(&self, table: &str) -> Result<Vec<ScoreSample>, StoreError> {
        Ok(self
            .load_rows(table)?
            .into_iter()
            .map(|r| ScoreSample {
                model: r.model,
                match_score: r.match_score,
            })
            .collect())
    }
}
