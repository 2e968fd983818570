//! Caller-facing response schema.
//!
//! ```json
//! {
//!   "summary": {
//!     "total_benchmarks": 1,
//!     "benchmarks_analyzed": ["aime"],
//!     "total_result_groups": 2,
//!     "models_analyzed": ["gpt-4o"],
//!     "analysis_type": "single_benchmark"
//!   },
//!   "benchmark_results": [{
//!     "benchmark": "aime",
//!     "metadata_columns": ["difficulty"],
//!     "results": [{
//!       "difficulty": "Hard",
//!       "model_scores": {"gpt-4o": {"score": 0.5, "questions": 2}},
//!       "avg_match_score": 0.5,
//!       "total_questions": 2,
//!       "models": ["gpt-4o"],
//!       "benchmark": "aime"
//!     }],
//!     "summary": {"total_groups": 1, "avg_score": 0.5, "max_score": 0.5, "min_score": 0.5, "total_questions": 2}
//!   }]
//! }
//! ```

use crate::types::{
    AnalysisReport, BenchmarkAnalysisResult, BenchmarkId, BenchmarkSummary, MetadataValue, ModelId,
    ResultGroup,
};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    SingleBenchmark,
    MultiBenchmark,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    pub total_benchmarks: usize,
    pub benchmarks_analyzed: Vec<BenchmarkId>,
    pub total_result_groups: usize,
    pub models_analyzed: Vec<ModelId>,
    pub analysis_type: AnalysisType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreCell {
    pub score: f64,
    pub questions: u64,
}

/// One result group as a flat object; metadata columns become top-level keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultItem {
    #[serde(flatten)]
    pub metadata: BTreeMap<String, MetadataValue>,
    /// Set for ungrouped benchmarks, where each group is one model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<ModelId>,
    /// Keyed by model in requested order, matching `models`.
    pub model_scores: IndexMap<ModelId, ScoreCell>,
    pub avg_match_score: f64,
    pub total_questions: u64,
    pub models: Vec<ModelId>,
    pub benchmark: BenchmarkId,
}

impl ResultItem {
    fn from_group(group: &ResultGroup, columns: &[String]) -> Self {
        let model_name = if columns.is_empty() {
            group.models().next().cloned()
        } else {
            None
        };

        Self {
            metadata: group.metadata_key.to_map(columns),
            model_name,
            model_scores: group
                .per_model_score
                .iter()
                .map(|(m, s)| {
                    (
                        m.clone(),
                        ScoreCell {
                            score: s.avg_score,
                            questions: s.question_count,
                        },
                    )
                })
                .collect(),
            avg_match_score: group.avg_score_across_models,
            total_questions: group.total_questions,
            models: group.models().cloned().collect(),
            benchmark: group.benchmark.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResultView {
    pub benchmark: BenchmarkId,
    pub metadata_columns: Vec<String>,
    pub results: Vec<ResultItem>,
    pub summary: BenchmarkSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&BenchmarkAnalysisResult> for BenchmarkResultView {
    fn from(result: &BenchmarkAnalysisResult) -> Self {
        Self {
            benchmark: result.benchmark.clone(),
            metadata_columns: result.grouping_columns.clone(),
            results: result
                .groups
                .iter()
                .map(|g| ResultItem::from_group(g, &result.grouping_columns))
                .collect(),
            summary: result.summary,
            error: result.error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub summary: ResponseSummary,
    pub benchmark_results: Vec<BenchmarkResultView>,
}

impl From<&AnalysisReport> for AnalysisResponse {
    fn from(report: &AnalysisReport) -> Self {
        let overall = &report.overall_summary;
        let analysis_type = if overall.benchmark_count == 1 {
            AnalysisType::SingleBenchmark
        } else {
            AnalysisType::MultiBenchmark
        };

        Self {
            summary: ResponseSummary {
                total_benchmarks: overall.benchmark_count,
                benchmarks_analyzed: report
                    .per_benchmark
                    .iter()
                    .map(|r| r.benchmark.clone())
                    .collect(),
                total_result_groups: overall.total_group_count,
                models_analyzed: overall.models_analyzed.clone(),
                analysis_type,
            },
            benchmark_results: report.per_benchmark.iter().map(Into::into).collect(),
        }
    }
}

impl AnalysisResponse {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One chart point per model × metadata key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub model: ModelId,
    pub benchmark: BenchmarkId,
    pub score: f64,
    pub question_count: u64,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, MetadataValue>,
}

pub fn chart_points(report: &AnalysisReport) -> Vec<ChartPoint> {
    report
        .per_benchmark
        .iter()
        .flat_map(|result| {
            result.groups.iter().flat_map(move |group| {
                let metadata = group.metadata_key.to_map(&result.grouping_columns);
                group.per_model_score.iter().map(move |(model, score)| ChartPoint {
                    model: model.clone(),
                    benchmark: result.benchmark.clone(),
                    score: score.avg_score,
                    question_count: score.question_count,
                    metadata: metadata.clone(),
                })
            })
        })
        .collect()
}
