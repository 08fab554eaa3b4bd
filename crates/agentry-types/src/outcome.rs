//! Execution outcome types.
//!
//! `StepResult` is what a capability invocation produces; `ExecutionResult`
//! is the aggregated report the engine hands back to its caller. Both are
//! immutable once produced: a step result is stored exactly once per
//! executed step, and a step that never ran has no result at all -- absence
//! is the only "skipped" signal.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// StepStatus / StepResult
// ---------------------------------------------------------------------------

/// Status of a single step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Partial,
    Error,
}

impl StepStatus {
    pub fn is_success(self) -> bool {
        self == StepStatus::Success
    }

    pub fn is_partial(self) -> bool {
        self == StepStatus::Partial
    }

    pub fn is_error(self) -> bool {
        self == StepStatus::Error
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Success => write!(f, "success"),
            StepStatus::Partial => write!(f, "partial"),
            StepStatus::Error => write!(f, "error"),
        }
    }
}

/// Result of executing one step's capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub status: StepStatus,
    /// Data payload returned by the capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error message when the status is Error (or a note on Partial).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Capability-specific metadata (API source, query echo, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Wall-clock execution time in seconds, measured from the first attempt
    /// through the returned attempt -- retry backoff included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
}

impl StepResult {
    /// A successful result carrying a data payload.
    pub fn success(data: Value) -> Self {
        Self {
            status: StepStatus::Success,
            data: Some(data),
            error: None,
            metadata: None,
            execution_time: None,
        }
    }

    /// A partial result: usable data, but incomplete.
    pub fn partial(data: Value) -> Self {
        Self {
            status: StepStatus::Partial,
            data: Some(data),
            error: None,
            metadata: None,
            execution_time: None,
        }
    }

    /// A failed result with an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Error,
            data: None,
            error: Some(message.into()),
            metadata: None,
            execution_time: None,
        }
    }

    /// Attach capability metadata.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Stamp the measured execution time in seconds.
    pub fn with_execution_time(mut self, seconds: f64) -> Self {
        self.execution_time = Some(seconds);
        self
    }
}

// ---------------------------------------------------------------------------
// ExecutionResult
// ---------------------------------------------------------------------------

/// Overall status of a plan execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Success => write!(f, "success"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One step's entry in a result bucket.
///
/// Which optional fields are populated depends on the bucket: successful
/// entries carry a duration, partial entries a duration and data, failed
/// entries an error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step_id: String,
    pub description: String,
    pub capability: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Step outcomes partitioned by status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultBuckets {
    pub successful: Vec<StepReport>,
    pub failed: Vec<StepReport>,
    pub partial: Vec<StepReport>,
}

/// Summary counts over a plan execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Length of the plan's full step list, executed or not.
    pub total_steps: usize,
    pub successful_steps: usize,
    pub failed_steps: usize,
    pub partial_steps: usize,
    /// Sum of recorded step durations in seconds (missing durations count
    /// as zero).
    pub total_execution_time: f64,
}

/// The aggregated result of a plan execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub run_id: Uuid,
    pub status: ExecutionStatus,
    pub task_description: String,
    pub execution_summary: ExecutionSummary,
    pub results: ResultBuckets,
    /// Non-empty step data payloads, keyed by step id.
    pub data: serde_json::Map<String, Value>,
    /// Run metadata; orchestration failures are recorded here.
    pub metadata: HashMap<String, Value>,
    /// Set only on engine-level failure (cycle, orchestration error) --
    /// never for individual step errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_predicates() {
        assert!(StepStatus::Success.is_success());
        assert!(StepStatus::Partial.is_partial());
        assert!(StepStatus::Error.is_error());
        assert!(!StepStatus::Partial.is_error());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StepStatus::Success.to_string(), "success");
        assert_eq!(ExecutionStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_step_result_constructors() {
        let ok = StepResult::success(json!({"temp": 21.5}));
        assert!(ok.status.is_success());
        assert!(ok.error.is_none());

        let err = StepResult::error("city not found");
        assert!(err.status.is_error());
        assert_eq!(err.error.as_deref(), Some("city not found"));
        assert!(err.data.is_none());

        let partial = StepResult::partial(json!([1, 2]))
            .with_metadata(json!({"truncated": true}))
            .with_execution_time(0.25);
        assert!(partial.status.is_partial());
        assert_eq!(partial.execution_time, Some(0.25));
    }

    #[test]
    fn test_step_result_serde_skips_absent_fields() {
        let encoded = serde_json::to_value(StepResult::error("boom")).unwrap();
        assert_eq!(encoded["status"], json!("error"));
        assert!(encoded.get("data").is_none());
        assert!(encoded.get("execution_time").is_none());
    }

    #[test]
    fn test_execution_result_roundtrip() {
        let result = ExecutionResult {
            run_id: Uuid::now_v7(),
            status: ExecutionStatus::Success,
            task_description: "demo".to_string(),
            execution_summary: ExecutionSummary {
                total_steps: 2,
                successful_steps: 2,
                failed_steps: 0,
                partial_steps: 0,
                total_execution_time: 1.5,
            },
            results: ResultBuckets::default(),
            data: serde_json::Map::new(),
            metadata: HashMap::new(),
            error: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let encoded = serde_json::to_string(&result).unwrap();
        let decoded: ExecutionResult = serde_json::from_str(&encoded).unwrap();
        assert!(decoded.is_success());
        assert_eq!(decoded.execution_summary.total_steps, 2);
        assert!(!encoded.contains("\"error\""), "absent error is omitted");
    }
}
