//! Markdown rendering of analyses and data overviews.
//!
//! Table choice per benchmark:
//!
//! | Benchmark shape                 | Table                                        |
//! |---------------------------------|----------------------------------------------|
//! | ungrouped                       | `Model \| Score \| Questions`, by score       |
//! | grouped, one requested model    | ranked groups with tier and percentile       |
//! | grouped, several models         | pivot, `N/A` where a model has no rows       |
//!
//! An overall ranking table follows when more than one ungrouped benchmark
//! was analyzed.

use crate::analysis::{
    BenchmarkOverview, ComposedAnalysis, CrossBenchmarkRanking, DataOverview, PivotTable,
    RankedBenchmark,
};
use crate::types::{BenchmarkAnalysisResult, BenchmarkSummary};
use std::fmt::Write;

const NOT_AVAILABLE: &str = "N/A";

struct MarkdownTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self, out: &mut String) {
        let _ = writeln!(out, "| {} |", self.headers.join(" | "));
        let rule: Vec<String> = self.headers.iter().map(|h| "-".repeat(h.len() + 2)).collect();
        let _ = writeln!(out, "|{}|", rule.join("|"));
        for row in &self.rows {
            let _ = writeln!(out, "| {} |", row.join(" | "));
        }
    }
}

fn score(value: f64) -> String {
    format!("{:.4}", value)
}

/// Formats a count with thousands separators.
fn count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Title-cases a snake_case column name for table headers.
fn column_header(column: &str) -> String {
    column
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Renders a composed analysis as markdown.
pub fn render_analysis(analysis: &ComposedAnalysis) -> String {
    let mut out = String::new();
    let overall = &analysis.report.overall_summary;
    let single_model = overall.models_analyzed.len() == 1;

    for (result, ranked) in analysis.report.per_benchmark.iter().zip(&analysis.ranked) {
        let _ = writeln!(out, "## {}\n", result.benchmark);

        if let Some(reason) = &result.error {
            let _ = writeln!(out, "Error: {}\n", reason);
            continue;
        }
        if result.groups.is_empty() {
            out.push_str("No data\n\n");
            continue;
        }

        render_summary_lines(&result.summary, &mut out);

        if !result.is_grouped() {
            render_model_table(ranked, &mut out);
        } else if single_model {
            render_rank_table(ranked, &mut out);
        } else if let Some(pivot) = analysis.pivots.iter().find(|p| p.benchmark == result.benchmark) {
            render_pivot(pivot, &mut out);
        }
        out.push('\n');
    }

    if let Some(ranking) = &analysis.ranking {
        if ranking.benchmarks.len() > 1 && !ranking.entries.is_empty() {
            out.push_str("## Overall ranking\n\n");
            render_ranking(ranking, &mut out);
            out.push('\n');
        }
    }

    out.push_str("## Summary\n\n");
    let _ = writeln!(out, "- Models analyzed: {}", overall.models_analyzed.len());
    let _ = writeln!(out, "- Benchmarks analyzed: {}", overall.benchmark_count);
    let _ = writeln!(out, "- Result groups: {}", overall.total_group_count);
    let unavailable = analysis
        .report
        .per_benchmark
        .iter()
        .filter(|r| !r.is_available())
        .count();
    if unavailable > 0 {
        let _ = writeln!(out, "- Unavailable benchmarks: {}", unavailable);
    }

    out.trim_end().to_string()
}

fn render_summary_lines(summary: &BenchmarkSummary, out: &mut String) {
    let _ = writeln!(out, "- Groups: {}", summary.total_groups);
    let _ = writeln!(out, "- Average: {}", score(summary.avg_score));
    let _ = writeln!(out, "- Best: {}", score(summary.max_score));
    let _ = writeln!(out, "- Worst: {}", score(summary.min_score));
    let _ = writeln!(out, "- Questions: {}\n", count(summary.total_questions));
}

fn render_model_table(ranked: &RankedBenchmark, out: &mut String) {
    let mut table = MarkdownTable::new(vec!["Model".into(), "Score".into(), "Questions".into()]);
    for entry in &ranked.entries {
        let model = entry
            .group
            .models()
            .next()
            .map(|m| m.to_string())
            .unwrap_or_default();
        table.push(vec![
            model,
            score(entry.group.avg_score_across_models),
            count(entry.group.total_questions),
        ]);
    }
    table.render(out);
}

fn render_rank_table(ranked: &RankedBenchmark, out: &mut String) {
    let mut headers = vec!["Rank".to_string()];
    headers.extend(ranked.grouping_columns.iter().map(|c| column_header(c)));
    headers.extend(["Score", "Questions", "Tier", "Percentile"].map(String::from));

    let mut table = MarkdownTable::new(headers);
    for entry in &ranked.entries {
        let mut row = vec![entry.rank.to_string()];
        row.extend(entry.group.metadata_key.values().iter().map(|v| v.to_string()));
        row.push(score(entry.group.avg_score_across_models));
        row.push(count(entry.group.total_questions));
        row.push(entry.tier.to_string());
        row.push(format!("top {}%", entry.percentile));
        table.push(row);
    }
    table.render(out);
}

fn render_pivot(pivot: &PivotTable, out: &mut String) {
    let mut headers: Vec<String> = pivot.columns.iter().map(|c| column_header(c)).collect();
    headers.extend(pivot.models.iter().map(|m| m.to_string()));

    let mut table = MarkdownTable::new(headers);
    for row in &pivot.rows {
        let mut cells: Vec<String> = row.key.values().iter().map(|v| v.to_string()).collect();
        cells.extend(row.cells.iter().map(|cell| match cell.score() {
            Some(s) => score(s),
            None => NOT_AVAILABLE.to_string(),
        }));
        table.push(cells);
    }
    table.render(out);
}

fn render_ranking(ranking: &CrossBenchmarkRanking, out: &mut String) {
    let mut headers = vec!["Rank".to_string(), "Model".to_string(), "Average".to_string()];
    headers.extend(ranking.benchmarks.iter().map(|b| b.to_string()));

    let mut table = MarkdownTable::new(headers);
    for (i, entry) in ranking.entries.iter().enumerate() {
        let mut row = vec![(i + 1).to_string(), entry.model.to_string(), score(entry.average)];
        row.extend(entry.per_benchmark.iter().map(|s| match s {
            Some(s) => score(*s),
            None => NOT_AVAILABLE.to_string(),
        }));
        table.push(row);
    }
    table.render(out);
}

/// One-line description of a benchmark result, for logs and short listings.
pub fn describe(result: &BenchmarkAnalysisResult) -> String {
    match &result.error {
        Some(reason) => format!("{}: unavailable ({})", result.benchmark, reason),
        None => format!(
            "{}: {} groups, avg {}",
            result.benchmark,
            result.summary.total_groups,
            score(result.summary.avg_score)
        ),
    }
}

/// Renders the data overview as markdown.
pub fn render_overview(overview: &DataOverview) -> String {
    let mut out = String::from("# Evaluation data overview\n");
    for entry in &overview.benchmarks {
        render_overview_entry(entry, &mut out);
    }
    out.trim_end().to_string()
}

fn render_overview_entry(entry: &BenchmarkOverview, out: &mut String) {
    let _ = writeln!(out, "\n## {} (`{}`)\n", entry.benchmark, entry.table_name);

    if let Some(error) = &entry.error {
        let _ = writeln!(out, "Status: error - {}", error);
        return;
    }

    match &entry.stats {
        Some(stats) => {
            let _ = writeln!(out, "- Records: {}", count(stats.total_records as u64));
            let _ = writeln!(out, "- Models: {}", stats.unique_models);
            let _ = writeln!(out, "- Average: {}", score(stats.avg_score));
            let _ = writeln!(out, "- Std dev: {}", score(stats.std_score));
            let _ = writeln!(
                out,
                "- Q1 / median / Q3: {} / {} / {}",
                score(stats.q1_score),
                score(stats.median_score),
                score(stats.q3_score)
            );
        }
        None => out.push_str("- Records: 0\n"),
    }

    if !entry.available_metadata.is_empty() {
        let _ = writeln!(out, "- Metadata: {}", entry.available_metadata.join(", "));
    }
}
