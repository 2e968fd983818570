//! Analysis engine: validates requests, runs per-benchmark retrieval and
//! aggregation, and composes the results.

use super::aggregation::aggregate;
use super::compose::{compose, ComposedAnalysis};
use super::overview::{score_stats, BenchmarkOverview, DataOverview};
use crate::config::BenchmarkRegistry;
use crate::error::AnalysisError;
use crate::query::{round_rows, QuerySpec};
use crate::request::{AnalysisRequest, BenchmarkPlan};
use crate::storage::ScoreSource;
use crate::types::{BenchmarkAnalysisResult, BenchmarkId, ModelId};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Stateless analysis engine over an injected registry and score source.
///
/// Each call answers one request and keeps nothing between calls. The
/// source is only read, so one engine can serve concurrent requests.
pub struct AnalysisEngine<S: ScoreSource> {
    registry: Arc<BenchmarkRegistry>,
    source: Arc<S>,
}

impl<S: ScoreSource> Clone for AnalysisEngine<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: ScoreSource + 'static> AnalysisEngine<S> {
    pub fn new(registry: Arc<BenchmarkRegistry>, source: Arc<S>) -> Self {
        Self { registry, source }
    }

    pub fn registry(&self) -> &BenchmarkRegistry {
        &self.registry
    }

    /// Analyzes a single benchmark.
    ///
    /// Unlike [`analyze`](Self::analyze), a source failure is returned as
    /// [`AnalysisError::DataSourceUnavailable`] instead of an error marker.
    pub fn analyze_benchmark(
        &self,
        benchmark: &BenchmarkId,
        models: &[ModelId],
        columns: &[String],
    ) -> Result<BenchmarkAnalysisResult, AnalysisError> {
        let spec = QuerySpec::build(&self.registry, benchmark, models, columns)?;
        fetch_and_aggregate(self.source.as_ref(), &spec)
    }

    /// Answers a request, processing benchmarks one after another.
    ///
    /// Validation errors fail the whole request before any retrieval. A
    /// benchmark whose source fails is reported with an error marker and does
    /// not affect the others.
    #[instrument(skip_all, fields(models = request.models.len(), benchmarks = request.benchmarks.len()))]
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<ComposedAnalysis, AnalysisError> {
        let validated = request.validate(&self.registry)?;

        let results: Vec<BenchmarkAnalysisResult> = validated
            .plans()
            .iter()
            .map(|plan| run_plan(&self.registry, self.source.as_ref(), plan, validated.models()))
            .collect();

        let composed = compose(&validated, results);
        info!(
            "Analyzed {} benchmarks, {} groups",
            composed.report.overall_summary.benchmark_count,
            composed.report.overall_summary.total_group_count
        );
        Ok(composed)
    }

    /// Answers a request with each benchmark on tokio's blocking pool.
    ///
    /// Results are collected as they complete and put back into requested
    /// order. A benchmark task that fails or panics yields that benchmark's
    /// error marker.
    #[instrument(skip_all, fields(models = request.models.len(), benchmarks = request.benchmarks.len()))]
    pub async fn analyze_parallel(
        &self,
        request: &AnalysisRequest,
    ) -> Result<ComposedAnalysis, AnalysisError> {
        let validated = request.validate(&self.registry)?;
        let models: Arc<[ModelId]> = validated.models().into();

        let mut pending = FuturesUnordered::new();
        for (index, plan) in validated.plans().iter().cloned().enumerate() {
            let registry = Arc::clone(&self.registry);
            let source = Arc::clone(&self.source);
            let models = Arc::clone(&models);
            let fallback = plan.clone();
            let handle = tokio::task::spawn_blocking(move || {
                run_plan(&registry, source.as_ref(), &plan, &models)
            });
            pending.push(async move { (index, fallback, handle.await) });
        }

        let mut results: Vec<(usize, BenchmarkAnalysisResult)> = Vec::with_capacity(pending.len());
        while let Some((index, plan, joined)) = pending.next().await {
            let result = joined.unwrap_or_else(|e| {
                warn!("Benchmark task for {} failed: {}", plan.benchmark, e);
                BenchmarkAnalysisResult::unavailable(
                    plan.benchmark,
                    plan.columns,
                    format!("analysis task failed: {}", e),
                )
            });
            results.push((index, result));
        }
        results.sort_by_key(|(index, _)| *index);

        let composed = compose(&validated, results.into_iter().map(|(_, r)| r).collect());
        info!(
            "Analyzed {} benchmarks in parallel, {} groups",
            composed.report.overall_summary.benchmark_count,
            composed.report.overall_summary.total_group_count
        );
        Ok(composed)
    }

    /// Score distribution of every registry benchmark.
    ///
    /// A benchmark whose table cannot be read carries an error and does not
    /// affect the others.
    #[instrument(skip_all)]
    pub fn overview(&self) -> DataOverview {
        let benchmarks = self
            .registry
            .benchmarks()
            .map(|entry| {
                let (stats, error) = match self.source.scan_scores(&entry.table) {
                    Ok(samples) => (score_stats(&samples), None),
                    Err(e) => {
                        warn!("Overview of {} failed: {}", entry.table, e);
                        (None, Some(format!("Table query failed: {}", e)))
                    }
                };
                BenchmarkOverview {
                    benchmark: entry.id.clone(),
                    table_name: entry.table.clone(),
                    available_metadata: entry.metadata_columns.clone(),
                    stats,
                    error,
                }
            })
            .collect();

        DataOverview { benchmarks }
    }
}

/// Retrieves and aggregates one validated benchmark plan, folding source
/// failures into an error marker.
fn run_plan<S: ScoreSource + ?Sized>(
    registry: &BenchmarkRegistry,
    source: &S,
    plan: &BenchmarkPlan,
    models: &[ModelId],
) -> BenchmarkAnalysisResult {
    info!("Analyzing {} grouped by {:?}", plan.benchmark, plan.columns);

    let outcome = QuerySpec::build(registry, &plan.benchmark, models, &plan.columns)
        .and_then(|spec| fetch_and_aggregate(source, &spec));

    match outcome {
        Ok(result) => {
            info!("{}: {} groups", plan.benchmark, result.groups.len());
            result
        }
        Err(e) => {
            warn!("{}", e);
            BenchmarkAnalysisResult::unavailable(
                plan.benchmark.clone(),
                plan.columns.clone(),
                e.to_string(),
            )
        }
    }
}

fn fetch_and_aggregate<S: ScoreSource + ?Sized>(
    source: &S,
    spec: &QuerySpec,
) -> Result<BenchmarkAnalysisResult, AnalysisError> {
    let (sql, params) = spec.to_sql();
    debug!(benchmark = %spec.benchmark, ?params, "{}", sql);

    let mut rows = source
        .fetch(spec)
        .map_err(|e| AnalysisError::unavailable(&spec.benchmark, e))?;
    round_rows(&mut rows);

    Ok(aggregate(&spec.benchmark, &spec.group_columns, &spec.models, rows))
}
