//! Cross-benchmark composition.
//!
//! Merges independent per-benchmark results into one [`AnalysisReport`] and
//! derives the comparison views built from it:
//!
//! - a ranked group list per benchmark (see [`rank`](super::rank));
//! - a pivot table per grouped benchmark, one row per metadata key and one
//!   cell per requested model;
//! - a per-model ranking across benchmarks when nothing is grouped.
//!
//! Composition never fails. Missing model/key or model/benchmark
//! combinations appear as explicit gaps, not as dropped rows.

use super::rank::{rank_groups, RankedGroup};
use crate::config::round_score;
use crate::request::ValidatedRequest;
use crate::types::{
    AnalysisReport, BenchmarkAnalysisResult, BenchmarkId, MetadataKey, ModelId, ModelScore,
    OverallSummary,
};
use serde::Serialize;

/// Everything derived from one request's per-benchmark results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedAnalysis {
    pub report: AnalysisReport,
    /// One entry per benchmark, in requested order.
    pub ranked: Vec<RankedBenchmark>,
    /// One table per benchmark that uses grouping columns.
    pub pivots: Vec<PivotTable>,
    /// Present only when no benchmark uses grouping columns.
    pub ranking: Option<CrossBenchmarkRanking>,
}

/// Groups of one benchmark sorted by mean score and rank-classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBenchmark {
    pub benchmark: BenchmarkId,
    pub grouping_columns: Vec<String>,
    pub entries: Vec<RankedGroup>,
}

/// One pivot cell: a model's score for a key, or a gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PivotCell {
    Score(ModelScore),
    NotAvailable,
}

impl PivotCell {
    pub fn score(&self) -> Option<f64> {
        match self {
            PivotCell::Score(s) => Some(s.avg_score),
            PivotCell::NotAvailable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub key: MetadataKey,
    /// One cell per model of the owning [`PivotTable`], in the same order.
    pub cells: Vec<PivotCell>,
    /// Mean of the available cells.
    pub mean: f64,
}

/// Metadata key × model comparison for one grouped benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub benchmark: BenchmarkId,
    pub columns: Vec<String>,
    pub models: Vec<ModelId>,
    /// Sorted by `mean` descending; ties keep first-seen key order.
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub model: ModelId,
    /// Mean over the benchmarks where the model has data.
    pub average: f64,
    /// Per-benchmark score in the ranking's benchmark order; `None` when the
    /// model has no data for that benchmark.
    pub per_benchmark: Vec<Option<f64>>,
}

/// Per-model ranking across ungrouped benchmarks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossBenchmarkRanking {
    pub benchmarks: Vec<BenchmarkId>,
    /// Sorted by `average` descending; ties keep requested model order.
    pub entries: Vec<RankingEntry>,
}

/// Composes per-benchmark results, given in requested benchmark order.
pub fn compose(request: &ValidatedRequest, results: Vec<BenchmarkAnalysisResult>) -> ComposedAnalysis {
    let ranked = results
        .iter()
        .map(|r| RankedBenchmark {
            benchmark: r.benchmark.clone(),
            grouping_columns: r.grouping_columns.clone(),
            entries: rank_groups(&r.groups),
        })
        .collect();

    let pivots = results
        .iter()
        .filter(|r| r.is_grouped())
        .map(|r| pivot(r, request.models()))
        .collect();

    let ranking = if request.is_ungrouped() {
        Some(cross_benchmark_ranking(&results, request.models()))
    } else {
        None
    };

    let overall_summary = OverallSummary {
        benchmark_count: results.len(),
        total_group_count: results.iter().map(|r| r.groups.len()).sum(),
        models_analyzed: request.models().to_vec(),
    };

    ComposedAnalysis {
        report: AnalysisReport {
            per_benchmark: results,
            overall_summary,
        },
        ranked,
        pivots,
        ranking,
    }
}

/// Builds the pivot table of one grouped benchmark.
pub fn pivot(result: &BenchmarkAnalysisResult, models: &[ModelId]) -> PivotTable {
    // (unrounded mean, row): sorting uses the unrounded value
    let mut rows: Vec<(f64, PivotRow)> = result
        .groups
        .iter()
        .map(|group| {
            let cells: Vec<PivotCell> = models
                .iter()
                .map(|m| match group.score_for(m) {
                    Some(score) => PivotCell::Score(*score),
                    None => PivotCell::NotAvailable,
                })
                .collect();
            let available: Vec<f64> = cells.iter().filter_map(PivotCell::score).collect();
            let mean = if available.is_empty() {
                0.0
            } else {
                available.iter().sum::<f64>() / available.len() as f64
            };
            let row = PivotRow {
                key: group.metadata_key.clone(),
                cells,
                mean: round_score(mean),
            };
            (mean, row)
        })
        .collect();

    rows.sort_by(|a, b| b.0.total_cmp(&a.0));

    PivotTable {
        benchmark: result.benchmark.clone(),
        columns: result.grouping_columns.clone(),
        models: models.to_vec(),
        rows: rows.into_iter().map(|(_, row)| row).collect(),
    }
}

/// Ranks models by their mean score across ungrouped benchmarks.
///
/// A benchmark where a model has no rows is left out of that model's mean.
/// Models with no data anywhere are omitted.
pub fn cross_benchmark_ranking(
    results: &[BenchmarkAnalysisResult],
    models: &[ModelId],
) -> CrossBenchmarkRanking {
    let mut entries: Vec<(f64, RankingEntry)> = models
        .iter()
        .filter_map(|model| {
            let per_benchmark: Vec<Option<f64>> = results
                .iter()
                .map(|r| {
                    r.groups
                        .iter()
                        .find_map(|g| g.score_for(model))
                        .map(|s| s.avg_score)
                })
                .collect();

            let scores: Vec<f64> = per_benchmark.iter().flatten().copied().collect();
            if scores.is_empty() {
                return None;
            }
            let average = scores.iter().sum::<f64>() / scores.len() as f64;
            Some((
                average,
                RankingEntry {
                    model: model.clone(),
                    average: round_score(average),
                    per_benchmark,
                },
            ))
        })
        .collect();

    entries.sort_by(|a, b| b.0.total_cmp(&a.0));

    CrossBenchmarkRanking {
        benchmarks: results.iter().map(|r| r.benchmark.clone()).collect(),
        entries: entries.into_iter().map(|(_, entry)| entry).collect(),
    }
}
