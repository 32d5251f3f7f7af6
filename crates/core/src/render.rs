//! Presentation renderer: pure mapping from session data to view models.

use crate::intake::{format_size, FileKind};
use crate::models::{serialize_score, IssueEntry, SelectedFile, ValidationResult, ValidationStatus};
use serde::Serialize;
use tracing::warn;

pub const NO_ISSUES_TEXT: &str = "No issues detected in this term sheet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Warning,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub tone: Tone,
    pub icon: &'static str,
    pub label: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    pub fn for_score(score: f64) -> Self {
        if score < 30.0 {
            RiskBucket::Low
        } else if score < 70.0 {
            RiskBucket::Medium
        } else {
            RiskBucket::High
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskBucket::Low => "green",
            RiskBucket::Medium => "amber",
            RiskBucket::High => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreView {
    #[serde(serialize_with = "serialize_score")]
    pub value: f64,
    pub bucket: RiskBucket,
    /// Percentage width of the score bar, always within 0..=100.
    pub bar_width: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueView {
    pub severity: String,
    pub severity_class: String,
    pub icon: &'static str,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum IssuesView {
    NoIssues,
    List(Vec<IssueView>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub status: StatusView,
    pub score: ScoreView,
    pub issues: IssuesView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileView {
    pub name: String,
    pub size: String,
    pub kind: FileKind,
    pub icon: &'static str,
}

pub fn render_status(status: &ValidationStatus) -> StatusView {
    match status {
        ValidationStatus::Valid => StatusView {
            tone: Tone::Success,
            icon: "✔",
            label: "Validation Successful",
            message: "This term sheet is valid and ready for processing.",
        },
        ValidationStatus::Warning => StatusView {
            tone: Tone::Warning,
            icon: "⚠",
            label: "Validation Warning",
            message: "This term sheet has minor issues that should be reviewed.",
        },
        ValidationStatus::Other(_) => StatusView {
            tone: Tone::Failure,
            icon: "✖",
            label: "Validation Failed",
            message: "This term sheet has critical issues that must be resolved.",
        },
    }
}

pub fn render_score(score: f64) -> ScoreView {
    ScoreView {
        value: score,
        bucket: RiskBucket::for_score(score),
        bar_width: score.clamp(0.0, 100.0).round() as u8,
    }
}

pub fn severity_icon(severity: &str) -> &'static str {
    match severity.to_lowercase().as_str() {
        "high" => "(!)",
        "medium" => "/!\\",
        "low" => "(i)",
        _ => "(o)",
    }
}

pub fn render_issues(entries: &[IssueEntry]) -> IssuesView {
    if entries.is_empty() {
        return IssuesView::NoIssues;
    }
    let items = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            IssueEntry::Issue(issue) => {
                let severity = issue.severity().to_string();
                Some(IssueView {
                    severity_class: severity.to_lowercase(),
                    icon: severity_icon(&severity),
                    description: issue.description().to_string(),
                    severity,
                })
            }
            IssueEntry::Malformed(raw) => {
                warn!(index, value = %raw, "skipping issue that is not a valid object");
                None
            }
        })
        .collect();
    IssuesView::List(items)
}

pub fn render_result(result: &ValidationResult) -> ResultView {
    ResultView {
        status: render_status(&result.status),
        score: render_score(result.risk_score),
        issues: render_issues(&result.issues),
    }
}

pub fn render_file(file: &SelectedFile) -> FileView {
    let kind = file.kind();
    FileView {
        name: file.name.clone(),
        size: format_size(file.size_bytes),
        kind,
        icon: kind.icon(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Issue;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn score_buckets_at_boundaries() {
        assert_eq!(RiskBucket::for_score(-3.0), RiskBucket::Low);
        assert_eq!(RiskBucket::for_score(29.0), RiskBucket::Low);
        assert_eq!(RiskBucket::for_score(30.0), RiskBucket::Medium);
        assert_eq!(RiskBucket::for_score(69.0), RiskBucket::Medium);
        assert_eq!(RiskBucket::for_score(70.0), RiskBucket::High);
        assert_eq!(RiskBucket::for_score(250.0), RiskBucket::High);
    }

    #[test]
    fn fractional_scores_bucket_on_the_raw_value() {
        let result = ValidationResult::from_body(r#"{"riskScore":29.6}"#).unwrap();
        let view = render_result(&result).score;
        assert_eq!(view.value, 29.6);
        assert_eq!(view.bucket, RiskBucket::Low);
        assert_eq!(view.bar_width, 30);

        let view = render_score(69.5);
        assert_eq!(view.bucket, RiskBucket::Medium);
        assert_eq!(render_score(29.999).bucket, RiskBucket::Low);
    }

    #[test]
    fn score_value_passes_through_but_bar_is_clamped() {
        let view = render_score(130.0);
        assert_eq!(view.value, 130.0);
        assert_eq!(view.bar_width, 100);
        assert_eq!(render_score(-10.0).bar_width, 0);
        assert_eq!(render_score(45.0).bar_width, 45);
    }

    #[test]
    fn valid_result_with_no_issues() {
        let view = render_result(&ValidationResult::new(ValidationStatus::Valid, 10, vec![]));
        assert_eq!(view.status.tone, Tone::Success);
        assert_eq!(view.status.label, "Validation Successful");
        assert_eq!(view.score.bucket, RiskBucket::Low);
        assert_eq!(view.score.bucket.color(), "green");
        assert_eq!(view.issues, IssuesView::NoIssues);
    }

    #[test]
    fn unknown_status_renders_as_failure() {
        let view = render_status(&ValidationStatus::Other("error".into()));
        assert_eq!(view.tone, Tone::Failure);
        assert_eq!(view.label, "Validation Failed");
        assert_eq!(render_status(&ValidationStatus::default()).tone, Tone::Failure);
    }

    #[test]
    fn issues_degrade_per_entry() {
        let entries = vec![
            IssueEntry::Issue(Issue::new("High", "Collateral")),
            IssueEntry::Malformed(json!(42)),
            IssueEntry::Issue(Issue::default()),
        ];
        let IssuesView::List(items) = render_issues(&entries) else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].severity_class, "high");
        assert_eq!(items[0].icon, "(!)");
        assert_eq!(items[1].severity, "unknown");
        assert_eq!(items[1].description, "Unknown issue");
        assert_eq!(items[1].icon, "(o)");
    }

    #[test]
    fn all_malformed_still_renders_a_list() {
        let entries = vec![IssueEntry::Malformed(json!("x"))];
        assert_eq!(render_issues(&entries), IssuesView::List(vec![]));
    }

    #[test]
    fn file_view_uses_formatted_size_and_icon() {
        let file = SelectedFile {
            path: PathBuf::from("/tmp/deal.pdf"),
            name: "deal.pdf".into(),
            size_bytes: 2_621_440,
            extension: "pdf".into(),
        };
        let view = render_file(&file);
        assert_eq!(view.size, "2.50 MB");
        assert_eq!(view.kind, FileKind::Pdf);
        assert_eq!(view.icon, "[pdf]");
    }
}
