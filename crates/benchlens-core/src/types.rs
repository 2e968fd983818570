//! Core data types shared by the query builder, score sources, and the
//! analysis pipeline.
//!
//! Everything here is request-scoped: values are created while answering one
//! [`AnalysisRequest`](crate::request::AnalysisRequest) and dropped afterwards.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Benchmark identifier (for example `"mmlu-redux"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkId(String);

impl BenchmarkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BenchmarkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BenchmarkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Model identifier (for example `"gpt-4o"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single categorical metadata value stored alongside a question.
///
/// Values have a total order so that grouping keys can be sorted: booleans
/// first, then numbers, then text. Integers and floats are one numeric
/// domain, so `Integer(2)` equals `Float(2.0)` and `2.5` sorts between `2`
/// and `3`. NaNs order by [`f64::total_cmp`] against other numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    fn variant_rank(&self) -> u8 {
        match self {
            MetadataValue::Bool(_) => 0,
            MetadataValue::Integer(_) | MetadataValue::Float(_) => 1,
            MetadataValue::Text(_) => 2,
        }
    }

    /// Converts a JSON scalar into a metadata value.
    ///
    /// Returns `None` for `null`, arrays, and objects; callers treat those as
    /// missing metadata.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(MetadataValue::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(MetadataValue::Integer)
                .or_else(|| n.as_f64().map(MetadataValue::Float)),
            serde_json::Value::String(s) => Some(MetadataValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl PartialEq for MetadataValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (MetadataValue::Bool(a), MetadataValue::Bool(b)) => a.cmp(b),
            (MetadataValue::Integer(a), MetadataValue::Integer(b)) => a.cmp(b),
            (MetadataValue::Float(a), MetadataValue::Float(b)) => {
                a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))
            }
            (MetadataValue::Integer(a), MetadataValue::Float(b)) => cmp_int_float(*a, *b),
            (MetadataValue::Float(a), MetadataValue::Integer(b)) => cmp_int_float(*b, *a).reverse(),
            (MetadataValue::Text(a), MetadataValue::Text(b)) => a.cmp(b),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}

/// 2^63, the first float above `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// The exact `i64` of an integral float, if it has one. `-0.0` maps to `0`.
fn integral_value(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Exact numeric comparison of an integer with a float.
fn cmp_int_float(a: i64, b: f64) -> Ordering {
    if b.is_nan() {
        return (a as f64).total_cmp(&b);
    }
    if b >= I64_BOUND {
        return Ordering::Less;
    }
    if b < -I64_BOUND {
        return Ordering::Greater;
    }
    match integral_value(b) {
        Some(i) => a.cmp(&i),
        // `a as f64` is integral and `b` is not, so rounding cannot flip the order
        None => (a as f64).total_cmp(&b),
    }
}

impl Hash for MetadataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_rank().hash(state);
        match self {
            MetadataValue::Bool(b) => b.hash(state),
            MetadataValue::Integer(i) => i.hash(state),
            MetadataValue::Float(f) => match integral_value(*f) {
                Some(i) => i.hash(state),
                None => f.to_bits().hash(state),
            },
            MetadataValue::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Integer(i) => write!(f, "{}", i),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

/// Ordered tuple of metadata values, one per grouping column.
///
/// The grouping identity of a [`ResultGroup`] within a benchmark. Empty when
/// the analysis has no grouping columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataKey(Vec<MetadataValue>);

impl MetadataKey {
    pub fn new(values: Vec<MetadataValue>) -> Self {
        Self(values)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn values(&self) -> &[MetadataValue] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs each value with its grouping column name.
    pub fn to_map(&self, columns: &[String]) -> BTreeMap<String, MetadataValue> {
        columns
            .iter()
            .cloned()
            .zip(self.0.iter().cloned())
            .collect()
    }
}

/// One stored per-question evaluation record.
///
/// `metadata` holds every benchmark-specific attribute of the question; a
/// `None` value is a SQL-style null and excludes the row from any grouping
/// that uses that column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScoreRow {
    #[serde(default)]
    pub question_id: u64,
    #[serde(rename = "model_name")]
    pub model: ModelId,
    pub benchmark: BenchmarkId,
    pub match_score: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, Option<MetadataValue>>,
}

impl RawScoreRow {
    pub fn new(benchmark: impl Into<BenchmarkId>, model: impl Into<ModelId>, match_score: f64) -> Self {
        Self {
            question_id: 0,
            model: model.into(),
            benchmark: benchmark.into(),
            match_score,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style helper that sets one metadata attribute.
    pub fn with_meta(mut self, column: &str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(column.to_string(), Some(value.into()));
        self
    }

    /// Builder-style helper that records an explicit null attribute.
    pub fn with_null(mut self, column: &str) -> Self {
        self.metadata.insert(column.to_string(), None);
        self
    }

    /// Returns the non-null value of `column`, if any.
    pub fn meta(&self, column: &str) -> Option<&MetadataValue> {
        self.metadata.get(column).and_then(Option::as_ref)
    }
}

/// One aggregated row returned by a score source for a
/// [`QuerySpec`](crate::query::QuerySpec): a model's average score and
/// question count within one metadata combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedScoreRow {
    pub model: ModelId,
    pub metadata: MetadataKey,
    pub avg_score: f64,
    pub question_count: u64,
}

/// One model's score inside a [`ResultGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub avg_score: f64,
    pub question_count: u64,
}

/// Scores of every requested model that has rows for one metadata key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultGroup {
    pub benchmark: BenchmarkId,
    pub metadata_key: MetadataKey,
    /// Entries in requested-model order; only models with data appear.
    pub per_model_score: Vec<(ModelId, ModelScore)>,
    /// Unweighted mean of the per-model averages.
    pub avg_score_across_models: f64,
    /// Shared question count: per-model counts summed, then divided by the
    /// number of contributing models.
    pub total_questions: u64,
}

impl ResultGroup {
    pub fn score_for(&self, model: &ModelId) -> Option<&ModelScore> {
        self.per_model_score
            .iter()
            .find(|(m, _)| m == model)
            .map(|(_, score)| score)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelId> {
        self.per_model_score.iter().map(|(m, _)| m)
    }
}

/// Summary statistics over all groups of one benchmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BenchmarkSummary {
    pub total_groups: usize,
    pub avg_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub total_questions: u64,
}

/// Aggregated result for one benchmark of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkAnalysisResult {
    pub benchmark: BenchmarkId,
    pub grouping_columns: Vec<String>,
    pub groups: Vec<ResultGroup>,
    pub summary: BenchmarkSummary,
    /// Set when the benchmark's data could not be retrieved; `groups` is then
    /// empty and `summary` all zero.
    pub error: Option<String>,
}

impl BenchmarkAnalysisResult {
    /// Builds the degraded entry for a benchmark whose source failed.
    pub fn unavailable(benchmark: BenchmarkId, grouping_columns: Vec<String>, reason: String) -> Self {
        Self {
            benchmark,
            grouping_columns,
            groups: Vec::new(),
            summary: BenchmarkSummary::default(),
            error: Some(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_grouped(&self) -> bool {
        !self.grouping_columns.is_empty()
    }
}

/// Request-wide counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallSummary {
    pub benchmark_count: usize,
    pub total_group_count: usize,
    pub models_analyzed: Vec<ModelId>,
}

/// Top-level result of one analysis request, in requested benchmark order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub per_benchmark: Vec<BenchmarkAnalysisResult>,
    pub overall_summary: OverallSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metadata_value_ordering() {
        let mut values = vec![
            MetadataValue::Text("b".into()),
            MetadataValue::Integer(3),
            MetadataValue::Text("a".into()),
            MetadataValue::Bool(true),
            MetadataValue::Float(1.5),
            MetadataValue::Integer(-1),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                MetadataValue::Bool(true),
                MetadataValue::Integer(-1),
                MetadataValue::Float(1.5),
                MetadataValue::Integer(3),
                MetadataValue::Text("a".into()),
                MetadataValue::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_integer_and_float_share_numeric_order() {
        assert_eq!(MetadataValue::Integer(2), MetadataValue::Float(2.0));
        assert_eq!(MetadataValue::Integer(0), MetadataValue::Float(-0.0));
        assert!(MetadataValue::Integer(3) > MetadataValue::Float(2.5));
        assert!(MetadataValue::Integer(2) < MetadataValue::Float(2.5));
        assert!(MetadataValue::Integer(i64::MAX) < MetadataValue::Float(9.3e18));
        assert!(MetadataValue::Integer(i64::MIN) > MetadataValue::Float(f64::NEG_INFINITY));

        let mut set = HashSet::new();
        set.insert(MetadataKey::new(vec![MetadataValue::Integer(2)]));
        assert!(set.contains(&MetadataKey::new(vec![MetadataValue::Float(2.0)])));
        assert!(!set.contains(&MetadataKey::new(vec![MetadataValue::Float(2.5)])));
    }

    #[test]
    fn test_metadata_key_hash_consistent_with_eq() {
        let a = MetadataKey::new(vec!["Hard".into(), MetadataValue::Float(0.5)]);
        let b = MetadataKey::new(vec!["Hard".into(), MetadataValue::Float(0.5)]);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_metadata_value_from_json() {
        use serde_json::json;
        assert_eq!(
            MetadataValue::from_json(&json!(2024)),
            Some(MetadataValue::Integer(2024))
        );
        assert_eq!(
            MetadataValue::from_json(&json!(0.25)),
            Some(MetadataValue::Float(0.25))
        );
        assert_eq!(
            MetadataValue::from_json(&json!("Easy")),
            Some(MetadataValue::Text("Easy".into()))
        );
        assert_eq!(MetadataValue::from_json(&json!(null)), None);
        assert_eq!(MetadataValue::from_json(&json!([1, 2])), None);
    }

    #[test]
    fn test_metadata_value_untagged_json() {
        let values: Vec<MetadataValue> = serde_json::from_str(r#"[true, 7, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                MetadataValue::Bool(true),
                MetadataValue::Integer(7),
                MetadataValue::Float(2.5),
                MetadataValue::Text("x".into()),
            ]
        );
    }

    #[test]
    fn test_raw_row_meta_skips_nulls() {
        let row = RawScoreRow::new("aime", "gpt-4o", 1.0)
            .with_meta("difficulty", "Hard")
            .with_null("solution_steps");
        assert_eq!(row.meta("difficulty"), Some(&MetadataValue::Text("Hard".into())));
        assert_eq!(row.meta("solution_steps"), None);
        assert_eq!(row.meta("missing"), None);
    }

    #[test]
    fn test_raw_row_json_uses_model_name() {
        let row = RawScoreRow::new("aime", "gpt-4o", 0.5).with_meta("difficulty", "Easy");
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"model_name\":\"gpt-4o\""));
        let back: RawScoreRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
