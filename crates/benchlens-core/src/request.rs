//! Analysis requests and their validation against the registry.
//!
//! Requests are validated once, at the boundary. Everything downstream works
//! on a [`ValidatedRequest`] and never re-checks membership.

use crate::config::BenchmarkRegistry;
use crate::error::AnalysisError;
use crate::types::{BenchmarkId, ModelId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grouping columns for a request.
///
/// Deserializes from either a JSON list (applied to every benchmark) or a
/// JSON object keyed by benchmark id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupingSpec {
    Uniform(Vec<String>),
    PerBenchmark(BTreeMap<BenchmarkId, Vec<String>>),
}

impl GroupingSpec {
    /// Ordered grouping columns for `benchmark`. A benchmark missing from a
    /// per-benchmark map is analyzed without grouping.
    pub fn columns_for(&self, benchmark: &BenchmarkId) -> &[String] {
        match self {
            GroupingSpec::Uniform(columns) => columns,
            GroupingSpec::PerBenchmark(map) => map.get(benchmark).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

impl Default for GroupingSpec {
    fn default() -> Self {
        GroupingSpec::Uniform(Vec::new())
    }
}

/// A request to analyze one or more models across one or more benchmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub models: Vec<ModelId>,
    pub benchmarks: Vec<BenchmarkId>,
    #[serde(default)]
    pub metadata_level: GroupingSpec,
}

impl AnalysisRequest {
    pub fn new(
        models: impl IntoIterator<Item = impl Into<ModelId>>,
        benchmarks: impl IntoIterator<Item = impl Into<BenchmarkId>>,
        metadata_level: GroupingSpec,
    ) -> Self {
        Self {
            models: models.into_iter().map(Into::into).collect(),
            benchmarks: benchmarks.into_iter().map(Into::into).collect(),
            metadata_level,
        }
    }

    /// Checks the request against the registry.
    ///
    /// Duplicate models collapse to their first occurrence. Grouping columns
    /// are kept exactly as given, duplicates included.
    pub fn validate(&self, registry: &BenchmarkRegistry) -> Result<ValidatedRequest, AnalysisError> {
        if self.models.is_empty() {
            return Err(AnalysisError::EmptyModelSet);
        }
        if self.benchmarks.is_empty() {
            return Err(AnalysisError::EmptyBenchmarkSet);
        }

        let mut models: Vec<ModelId> = Vec::with_capacity(self.models.len());
        for model in &self.models {
            if !registry.is_known_model(model) {
                return Err(AnalysisError::UnknownModel(model.to_string()));
            }
            if !models.contains(model) {
                models.push(model.clone());
            }
        }

        let mut plans = Vec::with_capacity(self.benchmarks.len());
        for benchmark in &self.benchmarks {
            if !registry.is_known_benchmark(benchmark) {
                return Err(AnalysisError::InvalidBenchmark(benchmark.to_string()));
            }
            let columns = self.metadata_level.columns_for(benchmark);
            if let Some(column) = columns.iter().find(|c| !registry.is_valid_column(benchmark, c)) {
                return Err(AnalysisError::UnknownMetadataColumn {
                    benchmark: benchmark.to_string(),
                    column: column.clone(),
                });
            }
            plans.push(BenchmarkPlan {
                benchmark: benchmark.clone(),
                columns: columns.to_vec(),
            });
        }

        Ok(ValidatedRequest { models, plans })
    }
}

/// Per-benchmark slice of a validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkPlan {
    pub benchmark: BenchmarkId,
    pub columns: Vec<String>,
}

/// A request that passed registry validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    models: Vec<ModelId>,
    plans: Vec<BenchmarkPlan>,
}

impl ValidatedRequest {
    /// Requested models, de-duplicated, in first-mention order.
    pub fn models(&self) -> &[ModelId] {
        &self.models
    }

    /// One plan per requested benchmark, in requested order.
    pub fn plans(&self) -> &[BenchmarkPlan] {
        &self.plans
    }

    /// True when no benchmark uses grouping columns.
    pub fn is_ungrouped(&self) -> bool {
        self.plans.iter().all(|p| p.columns.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_grouping_spec_from_list() {
        let spec: GroupingSpec = serde_json::from_str(r#"["difficulty", "subject"]"#).unwrap();
        assert_eq!(spec, GroupingSpec::Uniform(cols(&["difficulty", "subject"])));
        assert_eq!(spec.columns_for(&BenchmarkId::new("anything")), cols(&["difficulty", "subject"]));
    }

    #[test]
    fn test_grouping_spec_from_map() {
        let spec: GroupingSpec =
            serde_json::from_str(r#"{"mmlu": ["subject"], "aime": ["difficulty"]}"#).unwrap();
        assert_eq!(spec.columns_for(&BenchmarkId::new("mmlu")), cols(&["subject"]));
        assert_eq!(spec.columns_for(&BenchmarkId::new("aime")), cols(&["difficulty"]));
        assert!(spec.columns_for(&BenchmarkId::new("hle")).is_empty());
    }

    #[test]
    fn test_request_defaults_to_no_grouping() {
        let request: AnalysisRequest =
            serde_json::from_str(r#"{"models": ["gpt-4o"], "benchmarks": ["aime"]}"#).unwrap();
        assert_eq!(request.metadata_level, GroupingSpec::default());
    }

    #[test]
    fn test_validate_empty_collections() {
        let registry = BenchmarkRegistry::builtin();
        let none: [&str; 0] = [];
        let request = AnalysisRequest::new(none, ["aime"], GroupingSpec::default());
        assert_eq!(request.validate(&registry), Err(AnalysisError::EmptyModelSet));

        let request = AnalysisRequest::new(["gpt-4o"], none, GroupingSpec::default());
        assert_eq!(request.validate(&registry), Err(AnalysisError::EmptyBenchmarkSet));
    }

    #[test]
    fn test_validate_unknown_values_are_named() {
        let registry = BenchmarkRegistry::builtin();

        let request = AnalysisRequest::new(["gpt-4o"], ["hellaswag"], GroupingSpec::default());
        assert_eq!(
            request.validate(&registry),
            Err(AnalysisError::InvalidBenchmark("hellaswag".into()))
        );

        let request = AnalysisRequest::new(["gpt-5"], ["aime"], GroupingSpec::default());
        assert_eq!(
            request.validate(&registry),
            Err(AnalysisError::UnknownModel("gpt-5".into()))
        );

        let request = AnalysisRequest::new(
            ["gpt-4o"],
            ["aime"],
            GroupingSpec::Uniform(cols(&["difficulty", "subject"])),
        );
        assert_eq!(
            request.validate(&registry),
            Err(AnalysisError::UnknownMetadataColumn {
                benchmark: "aime".into(),
                column: "subject".into(),
            })
        );
    }

    #[test]
    fn test_validate_dedupes_models_keeps_columns() {
        let registry = BenchmarkRegistry::builtin();
        let request = AnalysisRequest::new(
            ["gpt-4o", "qwen-max", "gpt-4o"],
            ["mmlu"],
            GroupingSpec::Uniform(cols(&["subject", "subject"])),
        );
        let validated = request.validate(&registry).unwrap();
        assert_eq!(validated.models(), &[ModelId::new("gpt-4o"), ModelId::new("qwen-max")]);
        assert_eq!(validated.plans()[0].columns, cols(&["subject", "subject"]));
        assert!(!validated.is_ungrouped());
    }

    #[test]
    fn test_validate_per_benchmark_only_checks_requested() {
        let registry = BenchmarkRegistry::builtin();
        let mut map = BTreeMap::new();
        map.insert(BenchmarkId::new("mmlu"), cols(&["subject"]));
        map.insert(BenchmarkId::new("aime"), cols(&["not_a_column"]));
        let request = AnalysisRequest::new(["gpt-4o"], ["mmlu", "hle"], GroupingSpec::PerBenchmark(map));
        let validated = request.validate(&registry).unwrap();
        assert_eq!(validated.plans()[0].columns, cols(&["subject"]));
        assert!(validated.plans()[1].columns.is_empty());
    }
}
