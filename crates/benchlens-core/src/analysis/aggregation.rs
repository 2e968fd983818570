//! Grouping and aggregation of one benchmark's score rows.
//!
//! Turns the [`GroupedScoreRow`]s returned by a score source into
//! [`ResultGroup`]s and a [`BenchmarkSummary`].
//!
//! # Algorithm
//!
//! 1. Without grouping columns every row is its own group: empty key, a
//!    single model entry, and that model's question count as the total.
//! 2. With grouping columns, rows are folded by metadata key in first-seen
//!    order. Each key collects the per-model scores of every requested model
//!    that has rows for it. The group's mean is the unweighted mean of those
//!    per-model averages, and its question total is the per-model counts
//!    summed then divided by the number of models (integer division).
//! 3. The summary is computed over the flattened per-model averages of all
//!    groups, not over group means.

use crate::config::round_score;
use crate::types::{
    BenchmarkAnalysisResult, BenchmarkId, BenchmarkSummary, GroupedScoreRow, MetadataKey, ModelId,
    ModelScore, ResultGroup,
};
use std::collections::HashMap;

/// Aggregates one benchmark's rows into a [`BenchmarkAnalysisResult`].
///
/// Rows for models outside `models` are ignored. Per-model entries inside a
/// group follow the order of `models`.
pub fn aggregate(
    benchmark: &BenchmarkId,
    columns: &[String],
    models: &[ModelId],
    rows: Vec<GroupedScoreRow>,
) -> BenchmarkAnalysisResult {
    let rows = rows.into_iter().filter(|r| models.contains(&r.model));

    let groups = if columns.is_empty() {
        rows.map(|row| ResultGroup {
            benchmark: benchmark.clone(),
            metadata_key: MetadataKey::empty(),
            avg_score_across_models: row.avg_score,
            total_questions: row.question_count,
            per_model_score: vec![(
                row.model,
                ModelScore {
                    avg_score: row.avg_score,
                    question_count: row.question_count,
                },
            )],
        })
        .collect()
    } else {
        group_by_key(benchmark, models, rows)
    };

    let summary = summarize(&groups);

    BenchmarkAnalysisResult {
        benchmark: benchmark.clone(),
        grouping_columns: columns.to_vec(),
        groups,
        summary,
        error: None,
    }
}

fn group_by_key(
    benchmark: &BenchmarkId,
    models: &[ModelId],
    rows: impl Iterator<Item = GroupedScoreRow>,
) -> Vec<ResultGroup> {
    let model_index: HashMap<&ModelId, usize> =
        models.iter().enumerate().map(|(i, m)| (m, i)).collect();

    let mut key_index: HashMap<MetadataKey, usize> = HashMap::new();
    let mut folded: Vec<(MetadataKey, Vec<(ModelId, ModelScore)>)> = Vec::new();

    for row in rows {
        let slot = *key_index.entry(row.metadata.clone()).or_insert_with(|| {
            folded.push((row.metadata.clone(), Vec::new()));
            folded.len() - 1
        });
        let entries = &mut folded[slot].1;
        if entries.iter().any(|(m, _)| m == &row.model) {
            continue;
        }
        entries.push((
            row.model,
            ModelScore {
                avg_score: row.avg_score,
                question_count: row.question_count,
            },
        ));
    }

    folded
        .into_iter()
        .map(|(metadata_key, mut per_model_score)| {
            per_model_score.sort_by_key(|(m, _)| model_index.get(m).copied().unwrap_or(usize::MAX));

            let n = per_model_score.len();
            let score_sum: f64 = per_model_score.iter().map(|(_, s)| s.avg_score).sum();
            let question_sum: u64 = per_model_score.iter().map(|(_, s)| s.question_count).sum();

            ResultGroup {
                benchmark: benchmark.clone(),
                metadata_key,
                avg_score_across_models: round_score(score_sum / n as f64),
                total_questions: question_sum / n as u64,
                per_model_score,
            }
        })
        .collect()
}

/// Computes summary statistics over a benchmark's groups.
///
/// An empty group list yields an all-zero summary.
pub fn summarize(groups: &[ResultGroup]) -> BenchmarkSummary {
    let scores: Vec<f64> = groups
        .iter()
        .flat_map(|g| g.per_model_score.iter().map(|(_, s)| s.avg_score))
        .collect();

    if scores.is_empty() {
        return BenchmarkSummary {
            total_groups: groups.len(),
            ..BenchmarkSummary::default()
        };
    }

    let sum: f64 = scores.iter().sum();
    let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_score = scores.iter().copied().fold(f64::INFINITY, f64::min);

    BenchmarkSummary {
        total_groups: groups.len(),
        avg_score: round_score(sum / scores.len() as f64),
        max_score,
        min_score,
        total_questions: groups.iter().map(|g| g.total_questions).sum(),
    }
}
