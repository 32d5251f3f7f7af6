//! Stand-in data used when the validation backend is unreachable or fails.

use crate::models::{Issue, ValidationResult, ValidationStatus};
use crate::render::RiskBucket;

pub fn mock_validation_result() -> ValidationResult {
    ValidationResult::new(
        ValidationStatus::Warning,
        45,
        vec![
            Issue::new(
                "Medium",
                "The interest rate specified in section 3.2 conflicts with the reference rate in Appendix A.",
            ),
            Issue::new(
                "Low",
                "Missing counterparty contact information in section 1.1.",
            ),
            Issue::new(
                "High",
                "The collateral terms do not comply with regulatory requirements for this type of transaction.",
            ),
        ],
    )
}

const DEFAULT_REPLY: &str =
    "I'm here to help with your term sheet analysis. What would you like to know?";

const FIX_REPLY: &str = "To resolve the issues, I recommend reviewing each flagged item and updating the term sheet accordingly. Once corrected, you can upload the revised version for another validation check.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Risk,
    Issues,
    Validity,
    Fix,
    Summary,
}

/// Checked in order; the first rule with a matching keyword wins.
const RULES: &[(Topic, &[&str])] = &[
    (Topic::Risk, &["risk", "score"]),
    (Topic::Issues, &["issue", "problem"]),
    (Topic::Validity, &["valid"]),
    (Topic::Fix, &["fix", "resolve"]),
    (Topic::Summary, &["summary", "overview"]),
];

fn topic_for(message: &str) -> Option<Topic> {
    let lower = message.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| *topic)
}

fn risk_phrase(score: f64) -> &'static str {
    match RiskBucket::for_score(score) {
        RiskBucket::Low => "low risk",
        RiskBucket::Medium => "moderate risk",
        RiskBucket::High => "high risk",
    }
}

/// Canned assistant reply chosen by keyword matching against `message`.
pub fn mock_chat_response(message: &str, result: &ValidationResult) -> String {
    let Some(topic) = topic_for(message) else {
        return DEFAULT_REPLY.to_string();
    };
    let issue_count = result.well_formed_issues().count();
    match topic {
        Topic::Risk => format!(
            "The risk score is {}, which indicates {}. {}",
            result.risk_score,
            risk_phrase(result.risk_score),
            match RiskBucket::for_score(result.risk_score) {
                RiskBucket::Low => "This term sheet appears to be in good shape.",
                RiskBucket::Medium => "There are some issues that should be addressed.",
                RiskBucket::High => "There are significant issues that need to be resolved.",
            }
        ),
        Topic::Issues => {
            let high: Vec<_> = result
                .well_formed_issues()
                .filter(|i| i.severity().eq_ignore_ascii_case("high"))
                .collect();
            match (issue_count, high.first()) {
                (0, _) => "No issues were detected in this term sheet.".to_string(),
                (n, Some(critical)) => format!(
                    "I found {} {}, including {} high severity {}. The most critical one is: '{}'",
                    n,
                    plural(n, "issue", "issues"),
                    high.len(),
                    plural(high.len(), "issue", "issues"),
                    critical.description()
                ),
                (n, None) => {
                    let first = result
                        .well_formed_issues()
                        .next()
                        .map(|i| i.description())
                        .unwrap_or("Unknown issue");
                    format!(
                        "I found {} {}, but none are high severity. The most notable one is: '{}'",
                        n,
                        plural(n, "issue", "issues"),
                        first
                    )
                }
            }
        }
        Topic::Validity => match &result.status {
            ValidationStatus::Valid => {
                "This term sheet is valid and ready for processing.".to_string()
            }
            ValidationStatus::Warning => "This term sheet has some minor issues but is generally valid. You should review the issues before proceeding.".to_string(),
            ValidationStatus::Other(_) => "This term sheet has critical issues that must be resolved before it can be considered valid.".to_string(),
        },
        Topic::Fix => FIX_REPLY.to_string(),
        Topic::Summary => format!(
            "This term sheet has a validation status of {} with a risk score of {}. I detected {} {} that need attention. Overall, it {}.",
            result.status.as_str(),
            result.risk_score,
            issue_count,
            plural(issue_count, "issue", "issues"),
            match RiskBucket::for_score(result.risk_score) {
                RiskBucket::Low => "appears to be in good shape",
                RiskBucket::Medium => "requires some revisions before it can be approved",
                RiskBucket::High => "needs significant corrections",
            }
        ),
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_result_matches_fixture() {
        let result = mock_validation_result();
        assert_eq!(result.status, ValidationStatus::Warning);
        assert_eq!(result.risk_score, 45.0);
        let severities: Vec<_> = result.well_formed_issues().map(|i| i.severity()).collect();
        assert_eq!(severities, vec!["Medium", "Low", "High"]);
    }

    #[test]
    fn risk_question_mentions_score_and_moderate_risk() {
        let reply = mock_chat_response("what's my risk score?", &mock_validation_result());
        assert!(reply.contains("45"), "{reply}");
        assert!(reply.contains("moderate risk"), "{reply}");
    }

    #[test]
    fn risk_phrase_follows_buckets() {
        let low = ValidationResult::new(ValidationStatus::Valid, 10, vec![]);
        let high = ValidationResult::new(ValidationStatus::Other("invalid".into()), 70, vec![]);
        assert!(mock_chat_response("risk?", &low).contains("low risk"));
        assert!(mock_chat_response("Score please", &high).contains("high risk"));
    }

    #[test]
    fn earlier_rules_win() {
        // "risk" outranks "issue", "issue" outranks "valid".
        let result = mock_validation_result();
        let reply = mock_chat_response("any risk issues?", &result);
        assert!(reply.starts_with("The risk score is 45"));
        let reply = mock_chat_response("is the problem that it's invalid?", &result);
        assert!(reply.starts_with("I found 3 issues"));
    }

    #[test]
    fn issue_question_names_the_critical_issue() {
        let reply = mock_chat_response("Any ISSUES?", &mock_validation_result());
        assert_eq!(
            reply,
            "I found 3 issues, including 1 high severity issue. The most critical one is: 'The collateral terms do not comply with regulatory requirements for this type of transaction.'"
        );
    }

    #[test]
    fn issue_question_without_issues() {
        let clean = ValidationResult::new(ValidationStatus::Valid, 5, vec![]);
        assert_eq!(
            mock_chat_response("problems?", &clean),
            "No issues were detected in this term sheet."
        );
        let minor = ValidationResult::new(
            ValidationStatus::Warning,
            20,
            vec![Issue::new("Low", "Typo in section 2")],
        );
        assert!(mock_chat_response("problems?", &minor).contains("none are high severity"));
    }

    #[test]
    fn validity_fix_and_summary_replies() {
        let result = mock_validation_result();
        assert!(mock_chat_response("Is it valid?", &result).contains("generally valid"));
        assert_eq!(mock_chat_response("how do I fix this", &result), FIX_REPLY);
        assert_eq!(mock_chat_response("resolve", &result), FIX_REPLY);
        let summary = mock_chat_response("give me an overview", &result);
        assert!(summary.contains("status of warning"));
        assert!(summary.contains("risk score of 45"));
        assert!(summary.contains("3 issues"));
    }

    #[test]
    fn unmatched_message_gets_default_reply() {
        assert_eq!(
            mock_chat_response("hello there", &mock_validation_result()),
            DEFAULT_REPLY
        );
    }
}
