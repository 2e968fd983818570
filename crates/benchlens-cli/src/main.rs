//! BenchLens CLI - Command-line analysis of LLM benchmark results.
//!
//! # Usage
//!
//! ```bash
//! # Load per-question results
//! benchlens import --benchmark aime --file aime.jsonl
//!
//! # Compare models, grouped by a metadata column
//! benchlens analyze --models gpt-4o,qwen-max --benchmarks aime --group-by difficulty
//! benchlens analyze --models gpt-4o --benchmarks aime,hle --json
//! benchlens analyze --models gpt-4o --benchmarks mmlu,aime \
//!     --group-by-json '{"mmlu": ["subject"], "aime": ["difficulty"]}'
//!
//! # Registry and data overview
//! benchlens benchmarks
//! benchlens metadata mmlu --selected subject
//! benchlens overview
//! ```

mod analyze;
mod config;
mod import;
mod output;

use anyhow::Result;
use benchlens_core::analysis::AnalysisEngine;
use benchlens_core::request::AnalysisRequest;
use benchlens_core::types::BenchmarkId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// BenchLens benchmark analysis CLI.
///
/// Groups per-question evaluation scores by benchmark metadata, compares
/// models across benchmarks and ranks the results.
#[derive(Parser)]
#[command(name = "benchlens", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Custom data directory (default: $BENCHLENS_DATA_DIR or platform standard location)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Registry JSON file (default: $BENCHLENS_REGISTRY or the built-in catalog)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List known models
    Models {
        #[arg(long)]
        json: bool,
    },

    /// List benchmarks and their tables
    Benchmarks {
        #[arg(long)]
        json: bool,
    },

    /// Show a benchmark's metadata columns
    Metadata {
        benchmark: String,

        /// Columns already chosen for the first grouping level
        #[arg(long, value_delimiter = ',')]
        selected: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Analyze models over benchmarks
    Analyze {
        /// Models to compare (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        models: Vec<String>,

        /// Benchmarks to analyze (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        benchmarks: Vec<String>,

        /// Metadata columns to group by, applied to every benchmark
        #[arg(long, value_delimiter = ',', conflicts_with = "group_by_json")]
        group_by: Vec<String>,

        /// Grouping as JSON: a list, or an object keyed by benchmark id
        #[arg(long)]
        group_by_json: Option<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Include the flat chart point list
        #[arg(long)]
        chart_points: bool,

        /// Process benchmarks concurrently
        #[arg(long)]
        parallel: bool,
    },

    /// Score distribution of every benchmark table
    Overview {
        #[arg(long)]
        json: bool,
    },

    /// Import per-question results from a JSON Lines file
    Import {
        #[arg(long)]
        benchmark: String,

        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays parseable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let registry = config::load_registry(cli.registry.as_deref())?;

    let output = match cli.command {
        Command::Models { json } => output::format_models(&registry, json),
        Command::Benchmarks { json } => output::format_benchmarks(&registry, json),
        Command::Metadata {
            benchmark,
            selected,
            json,
        } => {
            let benchmark = BenchmarkId::new(benchmark);
            if !registry.is_known_benchmark(&benchmark) {
                anyhow::bail!("Unknown benchmark: {}", benchmark);
            }
            output::format_metadata(&registry, &benchmark, &selected, json)
        }
        Command::Analyze {
            models,
            benchmarks,
            group_by,
            group_by_json,
            json,
            chart_points,
            parallel,
        } => {
            let grouping = analyze::parse_grouping(&group_by, group_by_json.as_deref())?;
            let request = AnalysisRequest::new(models, benchmarks, grouping);
            let store = config::open_existing_store(cli.data_dir.as_ref())?;
            let analysis = analyze::execute_analysis(registry, store, &request, parallel).await?;

            if json {
                output::format_analysis_json(&analysis, chart_points)
            } else {
                output::format_analysis_human(&analysis, chart_points)
            }
        }
        Command::Overview { json } => {
            let store = config::open_existing_store(cli.data_dir.as_ref())?;
            let engine = AnalysisEngine::new(Arc::new(registry), Arc::new(store));
            let overview = engine.overview();
            if json {
                output::format_overview_json(&overview)
            } else {
                output::format_overview_human(&overview)
            }
        }
        Command::Import { benchmark, file } => {
            let store = config::open_or_create_store(cli.data_dir.as_ref())?;
            let benchmark = BenchmarkId::new(benchmark);
            let written = import::execute_import(&store, &registry, &benchmark, &file)?;
            format!("Imported {} rows into {}", written, benchmark)
        }
    };

    println!("{}", output);
    Ok(())
}
