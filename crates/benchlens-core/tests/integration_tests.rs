//! End-to-end integration tests for the analysis pipeline.
//!
//! These tests exercise the full workflow against both score sources:
//! 1. Storage: raw per-question rows → in-memory tables or redb tables
//! 2. Analysis: request validation → query → aggregation → composition
//! 3. Reporting: response JSON, chart points and markdown tables
//!
//! Run with: `cargo test -p benchlens-core --test integration_tests`

use benchlens_core::analysis::{AnalysisEngine, PivotCell, Tier};
use benchlens_core::config::BenchmarkRegistry;
use benchlens_core::error::AnalysisError;
use benchlens_core::report::{chart_points, render_analysis, AnalysisResponse};
use benchlens_core::request::{AnalysisRequest, GroupingSpec};
use benchlens_core::storage::{InMemoryScoreSource, RedbScoreStore, ScoreSource};
use benchlens_core::types::{BenchmarkId, BenchmarkSummary, MetadataValue, ModelId, RawScoreRow};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Registry with one benchmark `B` grouped on `meta`, and an open model set.
fn scenario_registry() -> BenchmarkRegistry {
    BenchmarkRegistry::from_json_str(
        r#"{"benchmarks": [
            {"id": "B", "table": "b_results", "metadata_columns": ["meta"]},
            {"id": "C", "table": "c_results", "metadata_columns": ["meta"]}
        ]}"#,
    )
    .unwrap()
}

/// Rows for the reference scenario:
/// M1/X averages 0.8 over 10, M2/X 0.6 over 10, M1/Y 0.4 over 5.
fn scenario_rows() -> Vec<RawScoreRow> {
    let mut rows = Vec::new();
    let mut push = |model: &str, meta: &str, correct: usize, total: usize| {
        for i in 0..total {
            let score = if i < correct { 1.0 } else { 0.0 };
            rows.push(RawScoreRow::new("B", model, score).with_meta("meta", meta));
        }
    };
    push("M1", "X", 8, 10);
    push("M2", "X", 6, 10);
    push("M1", "Y", 2, 5);
    rows
}

fn in_memory_engine(rows: Vec<RawScoreRow>) -> AnalysisEngine<InMemoryScoreSource> {
    let source = InMemoryScoreSource::new();
    source.insert_rows("b_results", rows).unwrap();
    AnalysisEngine::new(Arc::new(scenario_registry()), Arc::new(source))
}

fn redb_engine(rows: &[RawScoreRow]) -> (AnalysisEngine<RedbScoreStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = RedbScoreStore::open(temp_dir.path().join("scores.redb")).unwrap();
    store.insert_rows("b_results", rows).unwrap();
    let engine = AnalysisEngine::new(Arc::new(scenario_registry()), Arc::new(store));
    (engine, temp_dir)
}

fn grouped_request() -> AnalysisRequest {
    AnalysisRequest::new(["M1", "M2"], ["B"], GroupingSpec::Uniform(vec!["meta".into()]))
}

fn assert_scenario<S: ScoreSource + 'static>(engine: &AnalysisEngine<S>) {
    let composed = engine.analyze(&grouped_request()).unwrap();
    let result = &composed.report.per_benchmark[0];

    assert_eq!(result.groups.len(), 2);

    let x = &result.groups[0];
    assert_eq!(x.metadata_key.values(), &[MetadataValue::from("X")]);
    assert_eq!(x.score_for(&ModelId::new("M1")).unwrap().avg_score, 0.8);
    assert_eq!(x.score_for(&ModelId::new("M1")).unwrap().question_count, 10);
    assert_eq!(x.score_for(&ModelId::new("M2")).unwrap().avg_score, 0.6);
    assert_eq!(x.avg_score_across_models, 0.7);
    assert_eq!(x.total_questions, 10);

    let y = &result.groups[1];
    assert_eq!(y.per_model_score.len(), 1);
    assert_eq!(y.score_for(&ModelId::new("M1")).unwrap().avg_score, 0.4);
    assert_eq!(y.avg_score_across_models, 0.4);
    assert_eq!(y.total_questions, 5);

    assert_eq!(
        result.summary,
        BenchmarkSummary {
            total_groups: 2,
            avg_score: 0.6,
            max_score: 0.8,
            min_score: 0.4,
            total_questions: 15,
        }
    );
}

// ============================================================================
// End-to-End Scenario
// ============================================================================

#[test]
fn test_scenario_in_memory() {
    assert_scenario(&in_memory_engine(scenario_rows()));
}

#[test]
fn test_scenario_redb() {
    let (engine, _temp) = redb_engine(&scenario_rows());
    assert_scenario(&engine);
}

#[test]
fn test_scenario_views() {
    let engine = in_memory_engine(scenario_rows());
    let composed = engine.analyze(&grouped_request()).unwrap();

    // Pivot: Y has no M2 rows
    let pivot = &composed.pivots[0];
    assert_eq!(pivot.rows[0].key.values(), &[MetadataValue::from("X")]);
    assert_eq!(pivot.rows[1].cells[1], PivotCell::NotAvailable);

    // Ranked groups: X above Y, two groups → high / low
    let ranked = &composed.ranked[0].entries;
    assert_eq!(ranked[0].tier, Tier::High);
    assert_eq!(ranked[1].tier, Tier::Low);
    assert_eq!(ranked[1].percentile, 50);

    let text = render_analysis(&composed);
    assert!(text.contains("| Meta | M1 | M2 |"));
    assert!(text.contains("| Y | 0.4000 | N/A |"));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_ungrouped_totals_equal_row_count() {
    let rows = scenario_rows();
    let row_count = rows.len() as u64;
    let engine = in_memory_engine(rows);

    let request = AnalysisRequest::new(["M1", "M2"], ["B"], GroupingSpec::default());
    let composed = engine.analyze(&request).unwrap();
    let total: u64 = composed.report.per_benchmark[0]
        .groups
        .iter()
        .map(|g| g.total_questions)
        .sum();
    assert_eq!(total, row_count);
}

#[test]
fn test_grouped_models_subset_of_requested() {
    let mut rows = scenario_rows();
    rows.push(RawScoreRow::new("B", "M3", 1.0).with_meta("meta", "X"));
    let engine = in_memory_engine(rows);

    let request = AnalysisRequest::new(["M1", "M3"], ["B"], GroupingSpec::Uniform(vec!["meta".into()]));
    let composed = engine.analyze(&request).unwrap();
    let requested = [ModelId::new("M1"), ModelId::new("M3")];
    for group in &composed.report.per_benchmark[0].groups {
        assert!(group.models().all(|m| requested.contains(m)));
    }
}

#[test]
fn test_idempotent_reports() {
    let (engine, _temp) = redb_engine(&scenario_rows());
    let request = grouped_request();

    let first = AnalysisResponse::from(&engine.analyze(&request).unwrap().report)
        .to_json_pretty()
        .unwrap();
    let second = AnalysisResponse::from(&engine.analyze(&request).unwrap().report)
        .to_json_pretty()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_cross_benchmark_ranking_excludes_missing() {
    let source = InMemoryScoreSource::new();
    source.insert_rows("b_results", scenario_rows()).unwrap();
    source
        .insert_rows(
            "c_results",
            vec![
                RawScoreRow::new("C", "M2", 1.0),
                RawScoreRow::new("C", "M2", 1.0),
            ],
        )
        .unwrap();
    let engine = AnalysisEngine::new(Arc::new(scenario_registry()), Arc::new(source));

    let request = AnalysisRequest::new(["M1", "M2"], ["B", "C"], GroupingSpec::default());
    let composed = engine.analyze(&request).unwrap();
    let ranking = composed.ranking.unwrap();

    // M1 only has data for B: its average is its B score, not halved
    let m1 = ranking.entries.iter().find(|e| e.model == ModelId::new("M1")).unwrap();
    assert_eq!(m1.per_benchmark, vec![Some(0.6667), None]);
    assert_eq!(m1.average, 0.6667);

    // M2: mean(0.6, 1.0)
    assert_eq!(ranking.entries[0].model, ModelId::new("M2"));
    assert_eq!(ranking.entries[0].average, 0.8);
}

// ============================================================================
// Validation & Degradation
// ============================================================================

#[test]
fn test_validation_errors_name_value() {
    let engine = in_memory_engine(scenario_rows());

    let request = AnalysisRequest::new(["M1"], ["B"], GroupingSpec::Uniform(vec!["nope".into()]));
    let err = engine.analyze(&request).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::UnknownMetadataColumn {
            benchmark: "B".into(),
            column: "nope".into()
        }
    );
    assert!(err.is_validation());
}

#[test]
fn test_missing_table_degrades_one_benchmark() {
    let (engine, _temp) = redb_engine(&scenario_rows());
    let request = AnalysisRequest::new(["M1", "M2"], ["C", "B"], GroupingSpec::default());
    let composed = engine.analyze(&request).unwrap();

    let response = AnalysisResponse::from(&composed.report);
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["summary"]["analysis_type"], "multi_benchmark");
    assert!(value["benchmark_results"][0]["error"]
        .as_str()
        .unwrap()
        .contains("c_results"));
    assert_eq!(value["benchmark_results"][1]["results"].as_array().unwrap().len(), 2);
}

#[test]
fn test_per_benchmark_grouping() {
    let engine = in_memory_engine(scenario_rows());
    let mut grouping = BTreeMap::new();
    grouping.insert(BenchmarkId::new("B"), vec!["meta".to_string()]);
    let request = AnalysisRequest::new(["M1"], ["B"], GroupingSpec::PerBenchmark(grouping));

    let composed = engine.analyze(&request).unwrap();
    assert!(composed.ranking.is_none());
    let points = chart_points(&composed.report);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].metadata["meta"], MetadataValue::from("X"));
}

// ============================================================================
// Parallel Execution
// ============================================================================

#[tokio::test]
async fn test_parallel_preserves_requested_order() {
    let (engine, _temp) = redb_engine(&scenario_rows());
    let request = AnalysisRequest::new(["M1", "M2"], ["C", "B", "C"], GroupingSpec::default());

    let sequential = engine.analyze(&request).unwrap();
    let parallel = engine.analyze_parallel(&request).await.unwrap();
    assert_eq!(sequential.report, parallel.report);

    let order: Vec<&str> = parallel
        .report
        .per_benchmark
        .iter()
        .map(|r| r.benchmark.as_str())
        .collect();
    assert_eq!(order, vec!["C", "B", "C"]);
}

#[test]
fn test_overview_against_redb() {
    let (engine, _temp) = redb_engine(&scenario_rows());
    let overview = engine.overview();

    let b = &overview.benchmarks[0];
    let stats = b.stats.unwrap();
    assert_eq!(stats.total_records, 25);
    assert_eq!(stats.unique_models, 2);
    assert_eq!(stats.median_score, 1.0);

    let c = &overview.benchmarks[1];
    assert!(c.error.is_some());
}
