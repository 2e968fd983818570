//! Import command implementation.
//!
//! Loads per-question evaluation records from a JSON Lines file into the
//! score database. Each line is one object:
//!
//! ```json
//! {"model_name": "gpt-4o", "match_score": 1.0, "difficulty": "Hard", "competition_year": 2024}
//! ```
//!
//! `model_name` and `match_score` are required. `question_id` is optional.
//! Every other field is stored as question metadata; `null` values are kept
//! as nulls and exclude the row from groupings on that column.

use anyhow::{anyhow, bail, Context, Result};
use benchlens_core::config::BenchmarkRegistry;
use benchlens_core::storage::RedbScoreStore;
use benchlens_core::types::{BenchmarkId, MetadataValue, ModelId, RawScoreRow};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use tracing::{info, warn};

/// Fields with a fixed meaning; never stored as metadata.
const RESERVED_FIELDS: [&str; 4] = ["model_name", "match_score", "question_id", "benchmark"];

/// Parses JSON Lines records for `benchmark`. Blank lines are skipped.
pub fn parse_records(reader: impl BufRead, benchmark: &BenchmarkId) -> Result<Vec<RawScoreRow>> {
    let mut rows = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("Line {}: invalid JSON", line_no))?;
        let row = parse_record(&value, benchmark).with_context(|| format!("Line {}", line_no))?;
        rows.push(row);
    }

    Ok(rows)
}

fn parse_record(value: &Value, benchmark: &BenchmarkId) -> Result<RawScoreRow> {
    let object = value
        .as_object()
        .ok_or_else(|| anyhow!("expected a JSON object"))?;

    let model = object
        .get("model_name")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing string field `model_name`"))?;

    let match_score = object
        .get("match_score")
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("missing numeric field `match_score`"))?;
    if !(0.0..=1.0).contains(&match_score) {
        bail!("match_score {} is outside [0, 1]", match_score);
    }

    let question_id = match object.get("question_id") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .ok_or_else(|| anyhow!("`question_id` must be a non-negative integer"))?,
    };

    let mut metadata = BTreeMap::new();
    for (key, value) in object {
        if RESERVED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        match (value, MetadataValue::from_json(value)) {
            (Value::Null, _) => {
                metadata.insert(key.clone(), None);
            }
            (_, Some(meta)) => {
                metadata.insert(key.clone(), Some(meta));
            }
            (_, None) => warn!("Skipping non-scalar metadata field `{}`", key),
        }
    }

    Ok(RawScoreRow {
        question_id,
        model: ModelId::new(model),
        benchmark: benchmark.clone(),
        match_score,
        metadata,
    })
}

/// Imports a JSON Lines file into the benchmark's table.
///
/// Returns the number of rows written.
pub fn execute_import(
    store: &RedbScoreStore,
    registry: &BenchmarkRegistry,
    benchmark: &BenchmarkId,
    path: &Path,
) -> Result<usize> {
    let table = registry
        .table_for(benchmark)
        .ok_or_else(|| anyhow!("Unknown benchmark: {}", benchmark))?;

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let rows = parse_records(std::io::BufReader::new(file), benchmark)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let unknown_models: Vec<&str> = rows
        .iter()
        .filter(|r| !registry.is_known_model(&r.model))
        .map(|r| r.model.as_str())
        .collect();
    if let Some(model) = unknown_models.first() {
        warn!(
            "{} rows use models outside the registry (first: {}); they cannot be analyzed",
            unknown_models.len(),
            model
        );
    }

    let written = store
        .insert_rows(table, &rows)
        .with_context(|| format!("Failed to write rows to {}", table))?;
    info!("Imported {} rows into {}", written, table);
    Ok(written)
}
