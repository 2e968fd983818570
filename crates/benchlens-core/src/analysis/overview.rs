//! Global data overview: per-benchmark score distribution statistics.

use crate::config::round_score;
use crate::storage::ScoreSample;
use crate::types::BenchmarkId;
use serde::Serialize;
use std::collections::HashSet;

/// Distribution of raw match scores in one benchmark table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreStats {
    pub total_records: usize,
    pub unique_models: usize,
    pub avg_score: f64,
    /// Population standard deviation.
    pub std_score: f64,
    pub q1_score: f64,
    pub median_score: f64,
    pub q3_score: f64,
}

/// Overview entry for one registry benchmark.
///
/// Exactly one of three shapes: stats present, error present, or neither
/// (the table exists but holds no records).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkOverview {
    pub benchmark: BenchmarkId,
    pub table_name: String,
    pub available_metadata: Vec<String>,
    pub stats: Option<ScoreStats>,
    pub error: Option<String>,
}

/// Overview of every registry benchmark, in registry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataOverview {
    pub benchmarks: Vec<BenchmarkOverview>,
}

/// Computes distribution statistics; `None` for an empty sample set.
///
/// Quartiles use linear interpolation between closest ranks, matching SQL
/// `PERCENTILE_CONT`. All statistics are rounded.
pub fn score_stats(samples: &[ScoreSample]) -> Option<ScoreStats> {
    if samples.is_empty() {
        return None;
    }

    let mut scores: Vec<f64> = samples.iter().map(|s| s.match_score).collect();
    scores.sort_by(f64::total_cmp);

    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

    let unique_models = samples.iter().map(|s| &s.model).collect::<HashSet<_>>().len();

    Some(ScoreStats {
        total_records: samples.len(),
        unique_models,
        avg_score: round_score(mean),
        std_score: round_score(variance.sqrt()),
        q1_score: round_score(percentile_cont(&scores, 0.25)),
        median_score: round_score(percentile_cont(&scores, 0.5)),
        q3_score: round_score(percentile_cont(&scores, 0.75)),
    })
}

/// Continuous percentile of an ascending, non-empty slice.
fn percentile_cont(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelId;

    fn samples(scores: &[(&str, f64)]) -> Vec<ScoreSample> {
        scores
            .iter()
            .map(|(m, s)| ScoreSample {
                model: ModelId::new(*m),
                match_score: *s,
            })
            .collect()
    }

    #[test]
    fn test_empty() {
        assert!(score_stats(&[]).is_none());
    }

    #[test]
    fn test_stats() {
        let stats = score_stats(&samples(&[("a", 1.0), ("b", 0.0), ("a", 1.0), ("b", 0.0)])).unwrap();
        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.unique_models, 2);
        assert_eq!(stats.avg_score, 0.5);
        assert_eq!(stats.std_score, 0.5);
        assert_eq!(stats.q1_score, 0.0);
        assert_eq!(stats.median_score, 0.5);
        assert_eq!(stats.q3_score, 1.0);
    }

    #[test]
    fn test_percentile_cont_interpolates() {
        let sorted = [0.1, 0.2, 0.4, 0.8, 1.0];
        assert_eq!(percentile_cont(&sorted, 0.5), 0.4);
        // position 1.0 and 3.0 fall on exact ranks
        assert_eq!(percentile_cont(&sorted, 0.25), 0.2);
        assert_eq!(percentile_cont(&sorted, 0.75), 0.8);
        // position 0.5 between 0.1 and 0.2
        let sorted = [0.1, 0.2, 0.3];
        assert_eq!(round_score(percentile_cont(&sorted, 0.25)), 0.15);
    }

    #[test]
    fn test_single_sample() {
        let stats = score_stats(&samples(&[("a", 0.3)])).unwrap();
        assert_eq!(stats.std_score, 0.0);
        assert_eq!(stats.q1_score, 0.3);
        assert_eq!(stats.q3_score, 0.3);
    }
}
