//! Benchmark analysis pipeline.
//!
//! ```text
//! AnalysisRequest ─validate─▶ BenchmarkPlan ×N
//!        │                        │ QuerySpec::build
//!        │                        ▼
//!        │                  ScoreSource::fetch ──▶ aggregation ──▶ BenchmarkAnalysisResult
//!        │                                                                │
//!        └──────────────────────────────▶ compose ◀───────────────────────┘
//!                                            │
//!                     AnalysisReport + ranked groups + pivots + ranking
//! ```
//!
//! - [`aggregation`] - group rows by metadata key and summarize a benchmark
//! - [`rank`] - relative tier and percentile of each group
//! - [`compose`] - merge benchmarks, build pivots and the cross-benchmark ranking
//! - [`overview`] - score distribution per benchmark table
//! - [`engine`] - [`AnalysisEngine`], the entry point tying these together

pub mod aggregation;
pub mod compose;
pub mod engine;
pub mod overview;
pub mod rank;

pub use compose::{
    ComposedAnalysis, CrossBenchmarkRanking, PivotCell, PivotRow, PivotTable, RankedBenchmark,
    RankingEntry,
};
pub use engine::AnalysisEngine;
pub use overview::{BenchmarkOverview, DataOverview, ScoreStats};
pub use rank::{RankedGroup, Tier};
