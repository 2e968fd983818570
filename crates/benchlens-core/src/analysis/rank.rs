//! Relative rank classification.
//!
//! Assigns each group a tier and an ordinal percentile from its rank within
//! the observed set. Tiers describe relative standing, not absolute score
//! thresholds: two groups with near-identical scores can land in different
//! tiers purely through rank adjacency.

use crate::types::ResultGroup;
use serde::Serialize;
use std::fmt;

/// Relative standing of a group within its benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Single,
    Top,
    High,
    Mid,
    Low,
    Bottom,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Single => "single",
            Tier::Top => "top",
            Tier::High => "high",
            Tier::Mid => "mid",
            Tier::Low => "low",
            Tier::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies 1-based `rank` out of `total` groups.
///
/// - `total <= 1`: single
/// - `2..=3`: high for the first, low for the last, mid otherwise
/// - `4..=9`: quartile bands of `max(1, ceil(n / 4))` at each end
/// - `>= 10`: top / high / mid / low / bottom split at the 10th, 25th, 75th
///   and 90th percentile ranks
pub fn classify(rank: usize, total: usize) -> Tier {
    match total {
        0 | 1 => Tier::Single,
        2..=3 => {
            if rank == 1 {
                Tier::High
            } else if rank == total {
                Tier::Low
            } else {
                Tier::Mid
            }
        }
        4..=9 => {
            let q = total.div_ceil(4).max(1);
            if rank <= q {
                Tier::High
            } else if rank > total - q {
                Tier::Low
            } else {
                Tier::Mid
            }
        }
        n => {
            let p10 = (n / 10).max(1);
            let p25 = (n / 4).max(1);
            let p75 = (n * 3 / 4).max(1);
            let p90 = (n * 9 / 10).max(1);
            if rank <= p10 {
                Tier::Top
            } else if rank <= p25 {
                Tier::High
            } else if rank <= p75 {
                Tier::Mid
            } else if rank <= p90 {
                Tier::Low
            } else {
                Tier::Bottom
            }
        }
    }
}

/// Ordinal percentile of 1-based `rank` out of `total`; 100 for a single group.
pub fn percentile(rank: usize, total: usize) -> u32 {
    if total <= 1 {
        return 100;
    }
    let fraction = 1.0 - (rank.saturating_sub(1)) as f64 / total as f64;
    (fraction * 100.0).round() as u32
}

/// A group with its rank, tier and percentile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedGroup {
    pub rank: usize,
    pub percentile: u32,
    pub tier: Tier,
    pub group: ResultGroup,
}

/// Sorts groups by mean score descending (ties keep input order) and
/// classifies each.
pub fn rank_groups(groups: &[ResultGroup]) -> Vec<RankedGroup> {
    let mut sorted: Vec<&ResultGroup> = groups.iter().collect();
    sorted.sort_by(|a, b| b.avg_score_across_models.total_cmp(&a.avg_score_across_models));

    let total = sorted.len();
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, group)| RankedGroup {
            rank: i + 1,
            percentile: percentile(i + 1, total),
            tier: classify(i + 1, total),
            group: group.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BenchmarkId, MetadataKey, MetadataValue};

    #[test]
    fn test_ten_groups() {
        let tiers: Vec<Tier> = (1..=10).map(|r| classify(r, 10)).collect();
        assert_eq!(
            tiers,
            vec![
                Tier::Top,
                Tier::High,
                Tier::Mid,
                Tier::Mid,
                Tier::Mid,
                Tier::Mid,
                Tier::Mid,
                Tier::Low,
                Tier::Low,
                Tier::Bottom,
            ]
        );
        assert_eq!(percentile(1, 10), 100);
        assert_eq!(percentile(10, 10), 10);
    }

    #[test]
    fn test_single_group() {
        assert_eq!(classify(1, 1), Tier::Single);
        assert_eq!(percentile(1, 1), 100);
    }

    #[test]
    fn test_small_sets() {
        assert_eq!(classify(1, 2), Tier::High);
        assert_eq!(classify(2, 2), Tier::Low);
        assert_eq!(classify(2, 3), Tier::Mid);
        assert_eq!(percentile(2, 3), 67);
    }

    #[test]
    fn test_quartile_bands() {
        // n = 5: q = 2
        let tiers: Vec<Tier> = (1..=5).map(|r| classify(r, 5)).collect();
        assert_eq!(tiers, vec![Tier::High, Tier::High, Tier::Mid, Tier::Low, Tier::Low]);
        // n = 4: q = 1
        let tiers: Vec<Tier> = (1..=4).map(|r| classify(r, 4)).collect();
        assert_eq!(tiers, vec![Tier::High, Tier::Mid, Tier::Mid, Tier::Low]);
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Bottom).unwrap(), "\"bottom\"");
        assert_eq!(Tier::Single.to_string(), "single");
    }

    fn group(key: &str, score: f64) -> ResultGroup {
        ResultGroup {
            benchmark: BenchmarkId::new("b"),
            metadata_key: MetadataKey::new(vec![MetadataValue::from(key)]),
            per_model_score: Vec::new(),
            avg_score_across_models: score,
            total_questions: 1,
        }
    }

    #[test]
    fn test_rank_groups_stable() {
        let groups = vec![group("a", 0.5), group("b", 0.9), group("c", 0.5)];
        let ranked = rank_groups(&groups);
        let keys: Vec<String> = ranked
            .iter()
            .map(|r| r.group.metadata_key.values()[0].to_string())
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(ranked[0].tier, Tier::High);
        assert_eq!(ranked[2].tier, Tier::Low);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_rank_groups_empty() {
        assert!(rank_groups(&[]).is_empty());
    }
}
