use serde::de::Deserializer;
use serde::Serializer;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    /// Lowercase, without the leading dot; empty when the name has none.
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValidationStatus {
    Valid,
    Warning,
    Other(String),
}

impl Default for ValidationStatus {
    fn default() -> Self {
        ValidationStatus::Other("unknown".to_string())
    }
}

impl From<String> for ValidationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "valid" => ValidationStatus::Valid,
            "warning" => ValidationStatus::Warning,
            _ => ValidationStatus::Other(raw),
        }
    }
}

impl From<ValidationStatus> for String {
    fn from(status: ValidationStatus) -> Self {
        match status {
            ValidationStatus::Valid => "valid".to_string(),
            ValidationStatus::Warning => "warning".to_string(),
            ValidationStatus::Other(raw) => raw,
        }
    }
}

impl ValidationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Issue {
    pub fn new(severity: &str, description: &str) -> Self {
        Self {
            severity: Some(severity.to_string()),
            description: Some(description.to_string()),
        }
    }

    pub fn severity(&self) -> &str {
        match self.severity.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "unknown",
        }
    }

    pub fn description(&self) -> &str {
        match self.description.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => "Unknown issue",
        }
    }
}

/// One element of the backend's `issues` array. Entries that are not
/// well-formed issue objects are kept verbatim so rendering can skip them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IssueEntry {
    Issue(Issue),
    Malformed(serde_json::Value),
}

impl<'de> Deserialize<'de> for IssueEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let serde_json::Value::Object(fields) = &raw else {
            return Ok(IssueEntry::Malformed(raw));
        };
        Ok(IssueEntry::Issue(Issue {
            severity: string_field(fields, "severity"),
            description: string_field(fields, "description"),
        }))
    }
}

/// A wrongly typed field is dropped on its own; the rest of the issue stays.
fn string_field(fields: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => {
            warn!(field = key, value = %other, "issue field is not a string");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: ValidationStatus,
    /// Kept as sent; fractional and out-of-range scores are not normalized.
    #[serde(
        default,
        deserialize_with = "lenient_score",
        serialize_with = "serialize_score"
    )]
    pub risk_score: f64,
    #[serde(default, deserialize_with = "lenient_issues")]
    pub issues: Vec<IssueEntry>,
}

fn lenient_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ValidationStatus, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::String(s) => ValidationStatus::from(s),
        serde_json::Value::Null => ValidationStatus::default(),
        other => {
            warn!(value = %other, "status is not a string");
            ValidationStatus::Other(other.to_string())
        }
    })
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match &raw {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::Null => 0.0,
        other => {
            warn!(value = %other, "riskScore is not a number, using 0");
            0.0
        }
    })
}

const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole scores go out as JSON integers (`45`, not `45.0`).
pub(crate) fn serialize_score<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if score.fract() == 0.0 && score.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(*score as i64)
    } else {
        serializer.serialize_f64(*score)
    }
}

fn lenient_issues<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<IssueEntry>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    match raw {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect(),
        serde_json::Value::Null => Ok(Vec::new()),
        other => {
            warn!(value = %other, "issues is not an array, treating as empty");
            Ok(Vec::new())
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON response from server: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response from server")]
    Empty,
    #[error("response is not a JSON object")]
    NotAnObject,
}

impl ValidationResult {
    pub fn new(status: ValidationStatus, risk_score: impl Into<f64>, issues: Vec<Issue>) -> Self {
        Self {
            status,
            risk_score: risk_score.into(),
            issues: issues.into_iter().map(IssueEntry::Issue).collect(),
        }
    }

    /// Parses a validation response body. Missing `status` or `riskScore`
    /// are tolerated with a diagnostic and fall back to defaults.
    pub fn from_body(body: &str) -> Result<Self, ParseError> {
        Self::from_value(serde_json::from_str(body)?)
    }

    /// Same as [`ValidationResult::from_body`] for an already decoded body.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ParseError> {
        let object = match &value {
            serde_json::Value::Null => return Err(ParseError::Empty),
            serde_json::Value::Object(map) => map,
            _ => return Err(ParseError::NotAnObject),
        };
        let missing: Vec<&str> = ["status", "riskScore"]
            .into_iter()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "validation response is missing expected properties");
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Well-formed issues only, in response order.
    pub fn well_formed_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter_map(|entry| match entry {
            IssueEntry::Issue(issue) => Some(issue),
            IssueEntry::Malformed(_) => None,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAuthor {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: ChatAuthor,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            author: ChatAuthor::User,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            author: ChatAuthor::System,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_response() {
        let body = r#"{"status":"warning","riskScore":45,"issues":[{"severity":"High","description":"Collateral"}]}"#;
        let result = ValidationResult::from_body(body).unwrap();
        assert_eq!(result.status, ValidationStatus::Warning);
        assert_eq!(result.risk_score, 45.0);
        assert_eq!(
            result.issues,
            vec![IssueEntry::Issue(Issue::new("High", "Collateral"))]
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let result = ValidationResult::from_body("{}").unwrap();
        assert_eq!(result.status, ValidationStatus::Other("unknown".into()));
        assert_eq!(result.risk_score, 0.0);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn unknown_status_is_preserved() {
        let result = ValidationResult::from_body(r#"{"status":"invalid","riskScore":90}"#).unwrap();
        assert_eq!(result.status, ValidationStatus::Other("invalid".into()));
        assert_eq!(result.status.as_str(), "invalid");
    }

    #[test]
    fn fractional_and_out_of_range_scores_pass_through() {
        let result = ValidationResult::from_body(r#"{"riskScore":44.6}"#).unwrap();
        assert_eq!(result.risk_score, 44.6);
        assert_eq!(result.to_json()["riskScore"], 44.6);
        let result = ValidationResult::from_body(r#"{"riskScore":130}"#).unwrap();
        assert_eq!(result.risk_score, 130.0);
        assert_eq!(result.to_json()["riskScore"], json!(130));
        let result = ValidationResult::from_body(r#"{"riskScore":-5}"#).unwrap();
        assert_eq!(result.risk_score, -5.0);
        let result = ValidationResult::from_body(r#"{"riskScore":"high"}"#).unwrap();
        assert_eq!(result.risk_score, 0.0);
    }

    #[test]
    fn malformed_issue_entries_are_kept_aside() {
        let body = r#"{"status":"warning","riskScore":20,"issues":[
            "just text", null, ["High","array form"], {"severity": 3},
            {"description":"No severity"}
        ]}"#;
        let result = ValidationResult::from_body(body).unwrap();
        assert_eq!(result.issues.len(), 5);
        assert_eq!(result.issues[0], IssueEntry::Malformed(json!("just text")));
        assert_eq!(result.issues[1], IssueEntry::Malformed(json!(null)));
        assert!(matches!(result.issues[2], IssueEntry::Malformed(_)));
        let issues: Vec<_> = result.well_formed_issues().collect();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity(), "unknown");
        assert_eq!(issues[0].description(), "Unknown issue");
        assert_eq!(issues[1].severity(), "unknown");
        assert_eq!(issues[1].description(), "No severity");
    }

    #[test]
    fn wrongly_typed_issue_field_keeps_the_rest() {
        let body = r#"{"issues":[{"severity":3,"description":"Rate mismatch"}]}"#;
        let result = ValidationResult::from_body(body).unwrap();
        assert_eq!(
            result.issues,
            vec![IssueEntry::Issue(Issue {
                severity: None,
                description: Some("Rate mismatch".into()),
            })]
        );
    }

    #[test]
    fn non_array_issues_are_treated_as_empty() {
        let result = ValidationResult::from_body(r#"{"issues":"none"}"#).unwrap();
        assert!(result.issues.is_empty());
    }

    #[test]
    fn rejects_unparseable_or_empty_bodies() {
        assert!(matches!(
            ValidationResult::from_body("<html>"),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            ValidationResult::from_body("null"),
            Err(ParseError::Empty)
        ));
        assert!(matches!(
            ValidationResult::from_body("[1,2]"),
            Err(ParseError::NotAnObject)
        ));
    }

    #[test]
    fn serializes_with_wire_names() {
        let result = ValidationResult::new(
            ValidationStatus::Valid,
            10,
            vec![Issue::new("Low", "Typo")],
        );
        assert_eq!(
            result.to_json(),
            json!({
                "status": "valid",
                "riskScore": 10,
                "issues": [{"severity": "Low", "description": "Typo"}]
            })
        );
    }
}
