//! Query specification builder.
//!
//! Translates one benchmark slice of an analysis request into a
//! [`QuerySpec`]: which table to read, which models and non-null columns to
//! filter on, how to aggregate, and how to order the aggregated rows.
//!
//! A spec can be executed two ways:
//!
//! - [`QuerySpec::evaluate`] folds raw per-question rows directly (used by
//!   the in-memory and redb score sources);
//! - [`QuerySpec::to_sql`] renders the equivalent parameterized SQL for a
//!   relational store.
//!
//! Both produce the same rows in the same order.

use crate::config::{round_score, BenchmarkRegistry};
use crate::error::AnalysisError;
use crate::types::{BenchmarkId, GroupedScoreRow, MetadataKey, ModelId, RawScoreRow};
use std::collections::HashMap;

/// How rows are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// One row per model (no grouping columns).
    PerModel,
    /// One row per (grouping columns, model) combination.
    PerGroupAndModel,
}

/// Retrieval specification for one benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub benchmark: BenchmarkId,
    pub table: String,
    pub models: Vec<ModelId>,
    /// Grouping columns in precedence order. Each must be non-null.
    pub group_columns: Vec<String>,
    pub aggregation: Aggregation,
}

impl QuerySpec {
    /// Builds the retrieval spec for `benchmark`.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InvalidBenchmark`] if the registry does not know the benchmark
    /// - [`AnalysisError::EmptyModelSet`] if `models` is empty
    /// - [`AnalysisError::UnknownMetadataColumn`] if a column is not registered
    pub fn build(
        registry: &BenchmarkRegistry,
        benchmark: &BenchmarkId,
        models: &[ModelId],
        group_columns: &[String],
    ) -> Result<Self, AnalysisError> {
        let table = registry
            .table_for(benchmark)
            .ok_or_else(|| AnalysisError::InvalidBenchmark(benchmark.to_string()))?;

        if models.is_empty() {
            return Err(AnalysisError::EmptyModelSet);
        }

        if let Some(column) = group_columns
            .iter()
            .find(|c| !registry.is_valid_column(benchmark, c))
        {
            return Err(AnalysisError::UnknownMetadataColumn {
                benchmark: benchmark.to_string(),
                column: column.clone(),
            });
        }

        let aggregation = if group_columns.is_empty() {
            Aggregation::PerModel
        } else {
            Aggregation::PerGroupAndModel
        };

        Ok(Self {
            benchmark: benchmark.clone(),
            table: table.to_string(),
            models: models.to_vec(),
            group_columns: group_columns.to_vec(),
            aggregation,
        })
    }

    /// True when `row` passes the spec's filters: requested model and every
    /// grouping column non-null.
    pub fn matches(&self, row: &RawScoreRow) -> bool {
        self.models.contains(&row.model)
            && self.group_columns.iter().all(|c| row.meta(c).is_some())
    }

    /// Executes the spec over raw per-question rows.
    ///
    /// Rows are filtered, grouped by (grouping columns, model), averaged and
    /// counted, then ordered by grouping columns ascending and average score
    /// descending. Ties keep first-seen order.
    pub fn evaluate<'a>(&self, rows: impl IntoIterator<Item = &'a RawScoreRow>) -> Vec<GroupedScoreRow> {
        // (sum, count) per group, in first-seen order
        let mut index: HashMap<(MetadataKey, ModelId), usize> = HashMap::new();
        let mut accumulators: Vec<(MetadataKey, ModelId, f64, u64)> = Vec::new();

        for row in rows.into_iter().filter(|r| self.matches(r)) {
            let key = self.key_for(row);
            let slot = *index
                .entry((key.clone(), row.model.clone()))
                .or_insert_with(|| {
                    accumulators.push((key, row.model.clone(), 0.0, 0));
                    accumulators.len() - 1
                });
            let acc = &mut accumulators[slot];
            acc.2 += row.match_score;
            acc.3 += 1;
        }

        let mut grouped: Vec<GroupedScoreRow> = accumulators
            .into_iter()
            .map(|(metadata, model, sum, count)| GroupedScoreRow {
                model,
                metadata,
                avg_score: sum / count as f64,
                question_count: count,
            })
            .collect();

        // Stable sort: keys ascending, then score descending
        grouped.sort_by(|a, b| {
            a.metadata
                .cmp(&b.metadata)
                .then_with(|| b.avg_score.total_cmp(&a.avg_score))
        });

        grouped
    }

    fn key_for(&self, row: &RawScoreRow) -> MetadataKey {
        MetadataKey::new(
            self.group_columns
                .iter()
                .filter_map(|c| row.meta(c).cloned())
                .collect(),
        )
    }

    /// Renders the spec as a parameterized SQL statement.
    ///
    /// Returns the statement and the model-name parameters bound to its `?`
    /// placeholders. Identifiers come from the registry (validated in
    /// [`QuerySpec::build`]) and are backtick-quoted.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        let quoted: Vec<String> = self.group_columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders = vec!["?"; self.models.len()].join(", ");

        let mut conditions = vec![format!("model_name IN ({})", placeholders)];
        conditions.extend(quoted.iter().map(|c| format!("{} IS NOT NULL", c)));

        let aggregates = "AVG(match_score) AS avg_match_score, COUNT(*) AS total_questions";
        let table = quote_ident(&self.table);
        let where_clause = conditions.join(" AND ");

        let sql = match self.aggregation {
            Aggregation::PerModel => format!(
                "SELECT model_name, {aggregates} FROM {table} WHERE {where_clause} \
                 GROUP BY model_name ORDER BY avg_match_score DESC"
            ),
            Aggregation::PerGroupAndModel => {
                let columns = quoted.join(", ");
                format!(
                    "SELECT {columns}, model_name, {aggregates} FROM {table} WHERE {where_clause} \
                     GROUP BY {columns}, model_name ORDER BY {columns}, avg_match_score DESC"
                )
            }
        };

        let params = self.models.iter().map(|m| m.to_string()).collect();
        (sql, params)
    }
}

fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Rounds the averages of rows returned by a score source.
pub(crate) fn round_rows(rows: &mut [GroupedScoreRow]) {
    for row in rows {
        row.avg_score = round_score(row.avg_score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetadataValue;

    fn registry() -> BenchmarkRegistry {
        BenchmarkRegistry::builtin()
    }

    fn models(names: &[&str]) -> Vec<ModelId> {
        names.iter().map(|n| ModelId::new(*n)).collect()
    }

    #[test]
    fn test_build_errors() {
        let reg = registry();
        let err = QuerySpec::build(&reg, &BenchmarkId::new("nope"), &models(&["gpt-4o"]), &[])
            .unwrap_err();
        assert_eq!(err, AnalysisError::InvalidBenchmark("nope".into()));

        let err = QuerySpec::build(&reg, &BenchmarkId::new("aime"), &[], &[]).unwrap_err();
        assert_eq!(err, AnalysisError::EmptyModelSet);
    }

    #[test]
    fn test_build_aggregation_mode() {
        let reg = registry();
        let aime = BenchmarkId::new("aime");
        let spec = QuerySpec::build(&reg, &aime, &models(&["gpt-4o"]), &[]).unwrap();
        assert_eq!(spec.aggregation, Aggregation::PerModel);
        assert_eq!(spec.table, "aime_results");

        let spec =
            QuerySpec::build(&reg, &aime, &models(&["gpt-4o"]), &["difficulty".to_string()]).unwrap();
        assert_eq!(spec.aggregation, Aggregation::PerGroupAndModel);
    }

    #[test]
    fn test_to_sql_grouped() {
        let reg = registry();
        let spec = QuerySpec::build(
            &reg,
            &BenchmarkId::new("mmlu"),
            &models(&["gpt-4o", "qwen-max"]),
            &["subject".to_string(), "difficulty".to_string()],
        )
        .unwrap();
        let (sql, params) = spec.to_sql();
        assert!(sql.contains("FROM `mmlu_results`"));
        assert!(sql.contains("model_name IN (?, ?)"));
        assert!(sql.contains("`subject` IS NOT NULL AND `difficulty` IS NOT NULL"));
        assert!(sql.contains("GROUP BY `subject`, `difficulty`, model_name"));
        assert!(sql.contains("ORDER BY `subject`, `difficulty`, avg_match_score DESC"));
        assert_eq!(params, vec!["gpt-4o", "qwen-max"]);
    }

    #[test]
    fn test_to_sql_per_model() {
        let reg = registry();
        let spec =
            QuerySpec::build(&reg, &BenchmarkId::new("hle"), &models(&["gpt-4o"]), &[]).unwrap();
        let (sql, _) = spec.to_sql();
        assert!(sql.contains("GROUP BY model_name ORDER BY avg_match_score DESC"));
        assert!(!sql.contains("IS NOT NULL"));
    }

    #[test]
    fn test_evaluate_groups_per_key_and_model() {
        let reg = registry();
        let spec = QuerySpec::build(
            &reg,
            &BenchmarkId::new("aime"),
            &models(&["m1", "m2"]),
            &["difficulty".to_string()],
        )
        .unwrap();

        let rows = vec![
            RawScoreRow::new("aime", "m1", 1.0).with_meta("difficulty", "Hard"),
            RawScoreRow::new("aime", "m1", 0.0).with_meta("difficulty", "Hard"),
            RawScoreRow::new("aime", "m2", 1.0).with_meta("difficulty", "Hard"),
            RawScoreRow::new("aime", "m1", 1.0).with_meta("difficulty", "Easy"),
            RawScoreRow::new("aime", "m1", 1.0).with_null("difficulty"),
            RawScoreRow::new("aime", "m1", 1.0),
            RawScoreRow::new("aime", "m3", 1.0).with_meta("difficulty", "Hard"),
        ];

        let grouped = spec.evaluate(&rows);
        assert_eq!(grouped.len(), 3);

        // "Easy" sorts before "Hard"
        assert_eq!(grouped[0].metadata.values(), &[MetadataValue::Text("Easy".into())]);
        assert_eq!(grouped[0].question_count, 1);

        // Within "Hard", m2 (1.0) comes before m1 (0.5)
        assert_eq!(grouped[1].model, ModelId::new("m2"));
        assert_eq!(grouped[2].model, ModelId::new("m1"));
        assert_eq!(grouped[2].avg_score, 0.5);
        assert_eq!(grouped[2].question_count, 2);
    }

    #[test]
    fn test_evaluate_per_model_orders_by_score() {
        let reg = registry();
        let spec = QuerySpec::build(&reg, &BenchmarkId::new("aime"), &models(&["m1", "m2"]), &[])
            .unwrap();
        let rows = vec![
            RawScoreRow::new("aime", "m1", 0.2),
            RawScoreRow::new("aime", "m2", 0.9),
            RawScoreRow::new("aime", "m1", 0.4).with_null("difficulty"),
        ];
        let grouped = spec.evaluate(&rows);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].model, ModelId::new("m2"));
        assert!(grouped[0].metadata.is_empty());
        // Nulls do not exclude rows when nothing is grouped
        assert_eq!(grouped[1].question_count, 2);
    }

    #[test]
    fn test_evaluate_groups_numeric_values_by_value() {
        let reg = registry();
        let spec = QuerySpec::build(
            &reg,
            &BenchmarkId::new("math500"),
            &models(&["m1"]),
            &["level".to_string()],
        )
        .unwrap();

        let rows = vec![
            RawScoreRow::new("math500", "m1", 1.0).with_meta("level", MetadataValue::Integer(2)),
            RawScoreRow::new("math500", "m1", 0.0).with_meta("level", MetadataValue::Float(2.0)),
            RawScoreRow::new("math500", "m1", 1.0).with_meta("level", MetadataValue::Float(2.5)),
            RawScoreRow::new("math500", "m1", 1.0).with_meta("level", MetadataValue::Integer(3)),
        ];

        let grouped = spec.evaluate(&rows);
        let keys: Vec<&[MetadataValue]> = grouped.iter().map(|g| g.metadata.values()).collect();
        assert_eq!(
            keys,
            vec![
                &[MetadataValue::Integer(2)][..],
                &[MetadataValue::Float(2.5)][..],
                &[MetadataValue::Integer(3)][..],
            ]
        );
        assert_eq!(grouped[0].question_count, 2);
        assert_eq!(grouped[0].avg_score, 0.5);
    }

    #[test]
    fn test_evaluate_empty() {
        let reg = registry();
        let spec =
            QuerySpec::build(&reg, &BenchmarkId::new("aime"), &models(&["m1"]), &[]).unwrap();
        assert!(spec.evaluate(&[]).is_empty());
    }

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("a`b"), "`a``b`");
    }
}
