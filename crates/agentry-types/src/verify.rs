//! Verification outcome types.
//!
//! The verifier LLM-checks an execution result against the original task and
//! the plan's success criteria; `VerificationReport` is the structured shape
//! it is asked to produce (the schema in the verifier's prompt is derived
//! from this type).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured assessment of an execution result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VerificationReport {
    /// Whether the task was completed.
    pub is_complete: bool,
    /// Whether the results look accurate and reliable.
    pub is_accurate: bool,
    /// Quality score from 0.0 to 1.0.
    pub quality_score: f64,
    /// Critical information that is missing from the results.
    #[serde(default)]
    pub missing_information: Vec<String>,
    /// Problems identified in the execution or its data.
    #[serde(default)]
    pub issues: Vec<String>,
    /// Suggested improvements or follow-ups.
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl VerificationReport {
    /// Whether the result clears the quality bar without a fix-up pass.
    pub fn passed(&self) -> bool {
        self.is_complete && self.quality_score >= 0.7
    }
}

/// The verifier's final product: assessment plus user-facing output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedOutcome {
    pub verification: VerificationReport,
    /// Formatted output for the user (LLM-formatted, or the local fallback).
    pub final_output: Value,
    pub original_task: String,
    /// `is_complete && is_accurate`.
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_passed_threshold() {
        let mut report = VerificationReport {
            is_complete: true,
            is_accurate: true,
            quality_score: 0.9,
            missing_information: vec![],
            issues: vec![],
            recommendations: vec![],
        };
        assert!(report.passed());

        report.quality_score = 0.5;
        assert!(!report.passed());

        report.quality_score = 0.9;
        report.is_complete = false;
        assert!(!report.passed());
    }

    #[test]
    fn test_report_deserialize_defaults() {
        let report: VerificationReport = serde_json::from_value(json!({
            "is_complete": true,
            "is_accurate": false,
            "quality_score": 0.4
        }))
        .unwrap();
        assert!(report.issues.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_report_schema_names_fields() {
        let schema = serde_json::to_value(schemars::schema_for!(VerificationReport)).unwrap();
        let text = schema.to_string();
        assert!(text.contains("quality_score"));
        assert!(text.contains("missing_information"));
    }
}
