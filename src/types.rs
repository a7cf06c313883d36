// Type definitions shared by the API client, workflow and views

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a server-side dataset.
///
/// Issued by the backend and never modified locally. It doubles as a request
/// path segment and, after [`DatasetId::display_label`], as the on-screen name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human readable label for the dataset.
    ///
    /// Only the first underscore becomes a space; every word (a run of ASCII
    /// alphanumerics or `_`) then gets an uppercase first letter, so
    /// `"multi_word_name"` renders as `"Multi Word_name"`.
    pub fn display_label(&self) -> String {
        let spaced = self.0.replacen('_', " ", 1);
        let mut label = String::with_capacity(spaced.len());
        let mut in_word = false;
        for c in spaced.chars() {
            let is_word_char = c.is_ascii_alphanumeric() || c == '_';
            if is_word_char && !in_word {
                label.push(c.to_ascii_uppercase());
            } else {
                label.push(c);
            }
            in_word = is_word_char;
        }
        label
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetId {
    fn from(s: &str) -> Self {
        DatasetId(s.to_string())
    }
}

impl From<String> for DatasetId {
    fn from(s: String) -> Self {
        DatasetId(s)
    }
}

/// Analysis types the backend is known to propose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    GroupSum,
    GroupAvg,
    ValueCounts,
}

impl AnalysisKind {
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "group_sum" => Some(AnalysisKind::GroupSum),
            "group_avg" => Some(AnalysisKind::GroupAvg),
            "value_counts" => Some(AnalysisKind::ValueCounts),
            _ => None,
        }
    }

    /// Chart the backend answers this analysis with
    pub fn expected_chart(&self) -> ChartKind {
        match self {
            AnalysisKind::GroupSum | AnalysisKind::GroupAvg => ChartKind::Bar,
            AnalysisKind::ValueCounts => ChartKind::Pie,
        }
    }
}

/// A server-proposed analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub text: String,
    /// Forwarded to the analyze endpoint verbatim
    #[serde(rename = "type")]
    pub kind: String,
    pub column: String,
}

impl Suggestion {
    pub fn analysis_kind(&self) -> Option<AnalysisKind> {
        AnalysisKind::from_wire(&self.kind)
    }
}

/// Suggestions response for one dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl Catalog {
    pub fn find(&self, suggestion_id: &str) -> Option<&Suggestion> {
        self.suggestions.iter().find(|s| s.id == suggestion_id)
    }
}

/// Body of `POST /api/datasets/{id}/analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub column: String,
    pub group_by_col: String,
}

/// Response of the analyze endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub chart_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_labels")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub data: Vec<f64>,
}

/// Group keys come back as whatever type the grouped column had
fn deserialize_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect())
}

/// Renderable chart kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Pie => write!(f, "pie"),
        }
    }
}

/// Which backend call an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListDatasets,
    GetSuggestions,
    Analyze,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::ListDatasets => write!(f, "list datasets"),
            Operation::GetSuggestions => write!(f, "get suggestions"),
            Operation::Analyze => write!(f, "analyze"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network failure during {operation}: {message}")]
    NetworkFailure {
        operation: Operation,
        message: String,
    },

    #[error("No column available to group '{column}' by")]
    NoGroupingColumn { column: String },

    #[error("No dataset selected")]
    NoDatasetSelected,

    #[error("Unsupported chart type: {0}")]
    UnsupportedChartKind(String),

    #[error("Unknown suggestion: {0}")]
    UnknownSuggestion(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl AppError {
    pub fn network(operation: Operation, message: impl Into<String>) -> Self {
        AppError::NetworkFailure {
            operation,
            message: message.into(),
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_single_underscore() {
        assert_eq!(DatasetId::from("housing_prices").display_label(), "Housing Prices");
    }

    #[test]
    fn test_display_label_only_first_underscore_replaced() {
        assert_eq!(
            DatasetId::from("multi_word_name").display_label(),
            "Multi Word_name"
        );
    }

    #[test]
    fn test_display_label_plain_and_spaced() {
        assert_eq!(DatasetId::from("sales").display_label(), "Sales");
        assert_eq!(DatasetId::from("sales 2024-q1").display_label(), "Sales 2024-Q1");
        assert_eq!(DatasetId::from("").display_label(), "");
    }

    #[test]
    fn test_suggestion_wire_format() {
        let json = r#"{"id":"sum_price","text":"Sum of price","type":"group_sum","column":"price"}"#;
        let suggestion: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(suggestion.kind, "group_sum");
        assert_eq!(suggestion.analysis_kind(), Some(AnalysisKind::GroupSum));
        assert_eq!(
            suggestion.analysis_kind().map(|k| k.expected_chart()),
            Some(ChartKind::Bar)
        );
    }

    #[test]
    fn test_unknown_analysis_kind_is_kept() {
        let json = r#"{"id":"x","text":"X","type":"median","column":"c"}"#;
        let suggestion: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(suggestion.kind, "median");
        assert_eq!(suggestion.analysis_kind(), None);
    }

    #[test]
    fn test_analysis_request_body() {
        let request = AnalysisRequest {
            kind: "value_counts".to_string(),
            column: "city".to_string(),
            group_by_col: "price".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "value_counts", "column": "city", "group_by_col": "price"})
        );
    }

    #[test]
    fn test_analysis_result_accepts_numeric_labels() {
        let json = r#"{"chart_type":"bar","title":"t","labels":[1, 2.5, "x", null, true],"data":[1,2,3,4,5]}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.labels, vec!["1", "2.5", "x", "", "true"]);
        assert_eq!(result.data.len(), 5);
    }
}
