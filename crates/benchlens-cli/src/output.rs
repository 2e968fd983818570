//! Output formatting for CLI commands.
//!
//! Supports both human-readable terminal output (markdown tables) and JSON
//! for scripting.

use benchlens_core::analysis::{ComposedAnalysis, DataOverview};
use benchlens_core::config::BenchmarkRegistry;
use benchlens_core::report::{chart_points, render_analysis, render_overview, AnalysisResponse, ChartPoint};
use benchlens_core::types::BenchmarkId;
use serde::Serialize;

/// JSON output structure for an analysis
#[derive(Serialize)]
pub struct JsonAnalysis {
    #[serde(flatten)]
    pub response: AnalysisResponse,
    /// Flat point list for charting, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_points: Option<Vec<ChartPoint>>,
}

/// JSON output structure for registry metadata columns
#[derive(Serialize)]
pub struct JsonMetadata {
    pub benchmark: BenchmarkId,
    pub available_columns: Vec<String>,
    pub selected: Vec<String>,
    /// Columns still selectable for a second grouping level
    pub remaining_columns: Vec<String>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an analysis as JSON.
pub fn format_analysis_json(analysis: &ComposedAnalysis, with_chart_points: bool) -> String {
    let output = JsonAnalysis {
        response: AnalysisResponse::from(&analysis.report),
        chart_points: with_chart_points.then(|| chart_points(&analysis.report)),
    };
    to_json(&output)
}

/// Formats an analysis for human-readable terminal output.
pub fn format_analysis_human(analysis: &ComposedAnalysis, with_chart_points: bool) -> String {
    let mut output = render_analysis(analysis);
    if with_chart_points {
        output.push_str("\n\n## Chart points\n\n");
        output.push_str(&to_json(&chart_points(&analysis.report)));
    }
    output
}

/// Formats the data overview as JSON, keyed by benchmark like the overview
/// endpoint of the analysis service.
pub fn format_overview_json(overview: &DataOverview) -> String {
    let mut map = serde_json::Map::new();
    for entry in &overview.benchmarks {
        let mut fields = serde_json::Map::new();
        if let Some(error) = &entry.error {
            fields.insert("error".into(), error.clone().into());
            fields.insert("table_name".into(), entry.table_name.clone().into());
        } else {
            if let Some(stats) = &entry.stats {
                if let Ok(serde_json::Value::Object(stats)) = serde_json::to_value(stats) {
                    fields.extend(stats);
                }
            }
            fields.insert("table_name".into(), entry.table_name.clone().into());
            fields.insert(
                "available_metadata".into(),
                serde_json::Value::from(entry.available_metadata.clone()),
            );
        }
        map.insert(entry.benchmark.to_string(), serde_json::Value::Object(fields));
    }
    to_json(&map)
}

pub fn format_overview_human(overview: &DataOverview) -> String {
    render_overview(overview)
}

/// Formats the registry's models.
pub fn format_models(registry: &BenchmarkRegistry, json: bool) -> String {
    if json {
        return to_json(&registry.models());
    }
    if registry.models().is_empty() {
        return "Any model id is accepted (registry lists no models)".to_string();
    }
    let mut output = format!("{} models:\n", registry.models().len());
    for model in registry.models() {
        output.push_str(&format!("  {}\n", model));
    }
    output.trim_end().to_string()
}

/// Formats the registry's benchmarks with their tables.
pub fn format_benchmarks(registry: &BenchmarkRegistry, json: bool) -> String {
    if json {
        let entries: Vec<_> = registry.benchmarks().collect();
        return to_json(&entries);
    }
    let mut output = String::new();
    for entry in registry.benchmarks() {
        output.push_str(&format!(
            "{} (table: {}, {} metadata columns)\n",
            entry.id,
            entry.table,
            entry.metadata_columns.len()
        ));
    }
    output.trim_end().to_string()
}

/// Formats the metadata columns of one benchmark.
pub fn format_metadata(
    registry: &BenchmarkRegistry,
    benchmark: &BenchmarkId,
    selected: &[String],
    json: bool,
) -> String {
    let output = JsonMetadata {
        benchmark: benchmark.clone(),
        available_columns: registry.columns_for(benchmark).to_vec(),
        selected: selected.to_vec(),
        remaining_columns: registry.remaining_columns(benchmark, selected),
    };
    if json {
        return to_json(&output);
    }

    let mut text = format!("{} metadata columns:\n", benchmark);
    for column in &output.available_columns {
        let marker = if selected.contains(column) { "*" } else { " " };
        text.push_str(&format!(" {} {}\n", marker, column));
    }
    if !selected.is_empty() {
        text.push_str(&format!(
            "Remaining for a second level: {}\n",
            output.remaining_columns.join(", ")
        ));
    }
    text.trim_end().to_string()
}
