//! Per-run execution state.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use agentry_types::outcome::StepResult;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::EngineError;

/// Mutable state accumulated over one engine run.
///
/// The result store is append-only: a step's result is recorded exactly once
/// and never overwritten. A step the gate skipped has no entry at all --
/// absence is the only "skipped" signal. A context belongs to exactly one
/// run and must never be shared or reused across runs.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Run id (UUIDv7, time-sortable).
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Free-form run metadata. Seeded from the plan's metadata; the engine
    /// writes here on exceptional paths.
    pub metadata: HashMap<String, Value>,
    results: HashMap<String, StepResult>,
}

impl ExecutionContext {
    /// Create a fresh context for a new run.
    pub fn new() -> Self {
        Self {
            run_id: Uuid::now_v7(),
            started_at: Utc::now(),
            metadata: HashMap::new(),
            results: HashMap::new(),
        }
    }

    /// Record the result of an executed step.
    ///
    /// Recording a second result for the same step is an error; the stored
    /// result is left untouched.
    pub fn record(&mut self, step_id: &str, result: StepResult) -> Result<(), EngineError> {
        match self.results.entry(step_id.to_string()) {
            Entry::Occupied(_) => Err(EngineError::DuplicateResult(step_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(result);
                Ok(())
            }
        }
    }

    /// The recorded result for a step, if it executed.
    pub fn result(&self, step_id: &str) -> Option<&StepResult> {
        self.results.get(step_id)
    }

    /// All recorded results, keyed by step id.
    pub fn results(&self) -> &HashMap<String, StepResult> {
        &self.results
    }

    /// Number of steps that have executed.
    pub fn executed_count(&self) -> usize {
        self.results.len()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
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
    fn test_new_context_is_empty() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.executed_count(), 0);
        assert!(ctx.metadata.is_empty());
        assert!(ctx.result("anything").is_none());
    }

    #[test]
    fn test_record_and_lookup() {
        let mut ctx = ExecutionContext::new();
        ctx.record("fetch", StepResult::success(json!({"ok": true})))
            .unwrap();

        let stored = ctx.result("fetch").unwrap();
        assert!(stored.status.is_success());
        assert_eq!(ctx.executed_count(), 1);
    }

    #[test]
    fn test_double_record_is_rejected() {
        let mut ctx = ExecutionContext::new();
        ctx.record("fetch", StepResult::success(json!(1))).unwrap();

        let err = ctx
            .record("fetch", StepResult::error("second write"))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateResult(ref id) if id == "fetch"));

        // First result survives
        assert!(ctx.result("fetch").unwrap().status.is_success());
    }

    #[test]
    fn test_distinct_run_ids() {
        let a = ExecutionContext::new();
        let b = ExecutionContext::new();
        assert_ne!(a.run_id, b.run_id);
    }
}
