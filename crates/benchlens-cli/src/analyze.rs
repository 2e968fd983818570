//! Analyze command implementation.
//!
//! Builds an analysis request from command-line arguments and runs it
//! against the score database.

use anyhow::{Context, Result};
use benchlens_core::analysis::{AnalysisEngine, ComposedAnalysis};
use benchlens_core::config::BenchmarkRegistry;
use benchlens_core::report::markdown::describe;
use benchlens_core::request::{AnalysisRequest, GroupingSpec};
use benchlens_core::storage::ScoreSource;
use std::sync::Arc;
use tracing::info;

/// Builds the grouping spec from `--group-by` or `--group-by-json`.
///
/// `--group-by-json` accepts either a JSON list (same columns for every
/// benchmark) or an object keyed by benchmark id.
pub fn parse_grouping(group_by: &[String], group_by_json: Option<&str>) -> Result<GroupingSpec> {
    match group_by_json {
        Some(json) => serde_json::from_str(json)
            .with_context(|| format!("Invalid --group-by-json value: {}", json)),
        None => Ok(GroupingSpec::Uniform(group_by.to_vec())),
    }
}

/// Runs an analysis.
///
/// With `parallel`, each benchmark is processed on its own blocking task.
pub async fn execute_analysis<S: ScoreSource + 'static>(
    registry: BenchmarkRegistry,
    source: S,
    request: &AnalysisRequest,
    parallel: bool,
) -> Result<ComposedAnalysis> {
    let engine = AnalysisEngine::new(Arc::new(registry), Arc::new(source));

    info!(
        "Analyzing {} models over {} benchmarks",
        request.models.len(),
        request.benchmarks.len()
    );

    let composed = if parallel {
        engine.analyze_parallel(request).await
    } else {
        engine.analyze(request)
    }
    .context("Analysis failed")?;

    for result in &composed.report.per_benchmark {
        info!("{}", describe(result));
    }

    Ok(composed)
}
