//! In-memory score source.
//!
//! Holds raw per-question rows in a map of table name to rows. Used by tests
//! and by callers that already have rows loaded (for example from a JSONL
//! export) and want to analyze them without a database.

use super::{ScoreSample, ScoreSource, StoreError};
use crate::query::QuerySpec;
use crate::types::{GroupedScoreRow, RawScoreRow};
use std::collections::HashMap;
use std::sync::RwLock;

/// Score source backed by in-memory tables.
///
/// Tables only exist once created, either explicitly with
/// [`create_table`](Self::create_table) or implicitly by inserting rows.
/// Querying a table that was never created yields
/// [`StoreError::TableMissing`], matching a relational store.
#[derive(Default)]
pub struct InMemoryScoreSource {
    tables: RwLock<HashMap<String, Vec<RawScoreRow>>>,
}

impl InMemoryScoreSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table if it does not already exist.
    pub fn create_table(&self, table: &str) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        tables.entry(table.to_string()).or_default();
        Ok(())
    }

    /// Appends rows to `table`, creating it if needed.
    ///
    /// Rows without a question id are numbered after the table's current
    /// length. Returns the number of rows inserted.
    pub fn insert_rows(
        &self,
        table: &str,
        rows: impl IntoIterator<Item = RawScoreRow>,
    ) -> Result<usize, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        let stored = tables.entry(table.to_string()).or_default();

        let before = stored.len();
        for mut row in rows {
            if row.question_id == 0 {
                row.question_id = stored.len() as u64 + 1;
            }
            stored.push(row);
        }
        Ok(stored.len() - before)
    }

    /// Names of all tables, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Number of rows stored in `table`.
    pub fn row_count(&self, table: &str) -> Result<usize, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        tables
            .get(table)
            .map(Vec::len)
            .ok_or_else(|| StoreError::TableMissing(table.to_string()))
    }
}

impl ScoreSource for InMemoryScoreSource {
    fn fetch(&self, spec: &QuerySpec) -> Result<Vec<GroupedScoreRow>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        let rows = tables
            .get(&spec.table)
            .ok_or_else(|| StoreError::TableMissing(spec.table.clone()))?;
        Ok(spec.evaluate(rows))
    }

    fn scan_scores(&self, table: &str) -> Result<Vec<ScoreSample>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::TableMissing(table.to_string()))?;
        Ok(rows
            .iter()
            .map(|r| ScoreSample {
                model: r.model.clone(),
                match_score: r.match_score,
            })
            .collect())
    }
}
