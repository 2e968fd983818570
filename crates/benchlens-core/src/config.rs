//! Benchmark registry and score-format configuration.
//!
//! The [`BenchmarkRegistry`] maps each benchmark id to the table holding its
//! per-question results and to the metadata columns that may be used for
//! grouping. It also lists the known models. The registry is immutable once
//! built and is injected into the [`AnalysisEngine`](crate::analysis::AnalysisEngine);
//! nothing in the crate reads configuration from global state.
//!
//! # Usage
//!
//! ```
//! use benchlens_core::config::BenchmarkRegistry;
//! use benchlens_core::types::BenchmarkId;
//!
//! let registry = BenchmarkRegistry::builtin();
//! let aime = BenchmarkId::new("aime");
//! assert_eq!(registry.table_for(&aime), Some("aime_results"));
//! ```

use crate::types::{BenchmarkId, ModelId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Decimal places kept for every reported score.
///
/// Per-model averages are rounded to this precision when read from a score
/// source, and every derived mean is rounded again after computation.
pub const SCORE_DECIMALS: i32 = 4;

/// Rounds a score to [`SCORE_DECIMALS`] places.
pub fn round_score(value: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (value * factor).round() / factor
}

/// Errors raised while loading or validating a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read registry: {0}")]
    Io(String),
    #[error("Failed to parse registry: {0}")]
    Parse(String),
    #[error("Invalid registry: {0}")]
    Invalid(String),
}

/// Registry entry for one benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub id: BenchmarkId,
    /// Table (or redb table definition name) holding the benchmark's rows.
    pub table: String,
    /// Metadata columns legal for grouping, in display order.
    pub metadata_columns: Vec<String>,
}

/// Immutable benchmark → table → metadata-columns registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRegistry {
    benchmarks: Vec<BenchmarkEntry>,
    /// Known models. Empty means the model set is open and any id is accepted.
    #[serde(default)]
    models: Vec<ModelId>,
}

impl BenchmarkRegistry {
    /// Builds and validates a registry.
    pub fn new(benchmarks: Vec<BenchmarkEntry>, models: Vec<ModelId>) -> Result<Self, RegistryError> {
        let registry = Self { benchmarks, models };
        registry.validate()?;
        Ok(registry)
    }

    /// Parses a registry from JSON.
    ///
    /// ```json
    /// {
    ///   "benchmarks": [
    ///     {"id": "aime", "table": "aime_results", "metadata_columns": ["difficulty"]}
    ///   ],
    ///   "models": ["gpt-4o"]
    /// }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let registry: Self =
            serde_json::from_str(json).map_err(|e| RegistryError::Parse(e.to_string()))?;
        registry.validate()?;
        Ok(registry)
    }

    /// Reads and parses a JSON registry file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// The built-in catalog of supported benchmarks and models.
    pub fn builtin() -> Self {
        let entry = |id: &str, table: &str, columns: &[&str]| BenchmarkEntry {
            id: BenchmarkId::new(id),
            table: table.to_string(),
            metadata_columns: columns.iter().map(|c| c.to_string()).collect(),
        };

        let benchmarks = vec![
            entry(
                "aime",
                "aime_results",
                &["difficulty", "business_category", "competition_year", "problem_number", "solution_steps"],
            ),
            entry(
                "mmlu",
                "mmlu_results",
                &["difficulty", "business_category", "subject", "category", "knowledge_source"],
            ),
            entry(
                "mmlu-redux",
                "mmlu_redux_results",
                &["difficulty", "business_category", "subject", "category", "cultural_context"],
            ),
            entry(
                "mmlu-pro",
                "mmlu_pro_results",
                &["difficulty", "business_category", "subject", "category", "complexity", "interdisciplinary"],
            ),
            entry(
                "math500",
                "math500_results",
                &["difficulty", "business_category", "topic", "level", "proof_required", "theorem_dependency"],
            ),
            entry(
                "ds-mmlu",
                "ds_mmlu_results",
                &["difficulty", "business_category", "subject", "category", "industry_relevance"],
            ),
            entry(
                "hle",
                "hle_results",
                &["difficulty", "business_category", "category", "philosophical_domain", "consensus_level", "complexity"],
            ),
        ];

        let models = [
            "deepseek-r1",
            "deepseek-v3",
            "llama-4",
            "gpt-4o",
            "claude-3.5-sonnet",
            "qwen-max",
            "gemini-pro",
            "llama-3.1-405b",
            "mistral-large",
            "llama-4-Maverick",
            "llama-4-Scout",
            "GaussO-Think",
            "GaussO-Think-Ultra",
            "KIMI-K2",
            "KIMI-K2-AWQ",
        ]
        .into_iter()
        .map(ModelId::new)
        .collect();

        Self { benchmarks, models }
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let mut ids = HashSet::new();
        let mut tables = HashSet::new();
        for entry in &self.benchmarks {
            if entry.id.as_str().is_empty() {
                return Err(RegistryError::Invalid("benchmark id must not be empty".into()));
            }
            if entry.table.trim().is_empty() {
                return Err(RegistryError::Invalid(format!(
                    "benchmark '{}' has an empty table name",
                    entry.id
                )));
            }
            if !ids.insert(&entry.id) {
                return Err(RegistryError::Invalid(format!(
                    "duplicate benchmark id '{}'",
                    entry.id
                )));
            }
            if !tables.insert(entry.table.as_str()) {
                return Err(RegistryError::Invalid(format!(
                    "table '{}' is mapped by more than one benchmark",
                    entry.table
                )));
            }
        }
        Ok(())
    }

    pub fn benchmarks(&self) -> impl Iterator<Item = &BenchmarkEntry> {
        self.benchmarks.iter()
    }

    pub fn benchmark_ids(&self) -> Vec<BenchmarkId> {
        self.benchmarks.iter().map(|e| e.id.clone()).collect()
    }

    pub fn models(&self) -> &[ModelId] {
        &self.models
    }

    pub fn entry(&self, benchmark: &BenchmarkId) -> Option<&BenchmarkEntry> {
        self.benchmarks.iter().find(|e| &e.id == benchmark)
    }

    pub fn is_known_benchmark(&self, benchmark: &BenchmarkId) -> bool {
        self.entry(benchmark).is_some()
    }

    /// True when the model is listed, or when the registry's model set is open.
    pub fn is_known_model(&self, model: &ModelId) -> bool {
        self.models.is_empty() || self.models.contains(model)
    }

    pub fn table_for(&self, benchmark: &BenchmarkId) -> Option<&str> {
        self.entry(benchmark).map(|e| e.table.as_str())
    }

    /// Metadata columns legal for grouping on `benchmark`; empty if unknown.
    pub fn columns_for(&self, benchmark: &BenchmarkId) -> &[String] {
        self.entry(benchmark)
            .map(|e| e.metadata_columns.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_valid_column(&self, benchmark: &BenchmarkId, column: &str) -> bool {
        self.columns_for(benchmark).iter().any(|c| c == column)
    }

    /// Columns still available for a second grouping level once `selected`
    /// columns have been chosen.
    pub fn remaining_columns(&self, benchmark: &BenchmarkId, selected: &[String]) -> Vec<String> {
        self.columns_for(benchmark)
            .iter()
            .filter(|c| !selected.contains(c))
            .cloned()
            .collect()
    }
}

impl Default for BenchmarkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
