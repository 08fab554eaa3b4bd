//! Engine orchestration: sort, gate, run, aggregate -- with an outer error
//! boundary.
//!
//! `PlanExecutor` walks a plan through the states
//! `Sorting -> Iterating -> {Completed | Aborted} -> Aggregating`. A cycle
//! or unknown-dependency failure in `Sorting` terminates with a failed
//! result and zero step executions. During `Iterating`, a required step
//! whose result is Error aborts the remaining steps; optional-step failures
//! are recorded and skipped over. No error escapes `execute`: the caller
//! always receives a structured `ExecutionResult`.

use agentry_types::config::RetrySettings;
use agentry_types::outcome::{ExecutionResult, ExecutionStatus};
use agentry_types::plan::Plan;
use serde_json::Value;

use super::aggregate::aggregate;
use super::context::ExecutionContext;
use super::dag::topological_order;
use super::gate::is_eligible;
use super::runner::{CapabilityExecutor, StepRunner};
use super::EngineError;

/// Metadata key under which orchestration failures are recorded.
pub const EXECUTION_ERROR_KEY: &str = "execution_error";

/// Terminal state of the iteration loop.
enum Iteration {
    Completed,
    Aborted,
}

/// Dependency-ordered plan executor.
///
/// Steps run strictly one at a time in a fixed topological order: the engine
/// never executes two steps concurrently, even when they are independent.
/// Generic over the capability backend, which is the only collaborator the
/// engine consumes.
pub struct PlanExecutor<E> {
    capabilities: E,
    runner: StepRunner,
}

impl<E: CapabilityExecutor> PlanExecutor<E> {
    /// Create an executor with an explicit retry policy.
    ///
    /// Settings are bound at construction; nothing is read from the
    /// environment during execution.
    pub fn new(capabilities: E, retry: RetrySettings) -> Self {
        Self {
            capabilities,
            runner: StepRunner::new(retry),
        }
    }

    /// Execute every eligible step of `plan` and aggregate the outcome.
    ///
    /// Infallible at the signature level: configuration errors (cycles,
    /// unresolved dependencies) and orchestration errors all surface as a
    /// failed `ExecutionResult`, never as an `Err` or a panic.
    pub async fn execute(&self, plan: &Plan) -> ExecutionResult {
        let mut ctx = ExecutionContext::new();
        ctx.metadata
            .extend(plan.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));

        tracing::info!(
            run_id = %ctx.run_id,
            plan_id = %plan.id,
            steps = plan.steps.len(),
            "starting plan execution"
        );

        let result = match self.run_steps(plan, &mut ctx).await {
            Ok(Iteration::Completed) => aggregate(plan, &ctx, ExecutionStatus::Success, None),
            Ok(Iteration::Aborted) => aggregate(plan, &ctx, ExecutionStatus::Failed, None),
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(
                    run_id = %ctx.run_id,
                    error = message.as_str(),
                    "plan execution failed before completion"
                );
                ctx.metadata
                    .insert(EXECUTION_ERROR_KEY.to_string(), Value::String(message.clone()));
                aggregate(plan, &ctx, ExecutionStatus::Failed, Some(message))
            }
        };

        tracing::info!(
            run_id = %ctx.run_id,
            status = %result.status,
            executed = ctx.executed_count(),
            "plan execution finished"
        );

        result
    }

    async fn run_steps(
        &self,
        plan: &Plan,
        ctx: &mut ExecutionContext,
    ) -> Result<Iteration, EngineError> {
        let ordered = topological_order(&plan.steps)?;

        for step in ordered {
            if !is_eligible(step, ctx) {
                tracing::debug!(
                    step_id = step.id.as_str(),
                    "step gated out by missing or failed dependency"
                );
                continue;
            }

            let result = self.runner.run(&self.capabilities, step, ctx).await;
            let abort = result.status.is_error() && !step.optional;
            ctx.record(&step.id, result)?;

            if abort {
                tracing::warn!(
                    step_id = step.id.as_str(),
                    "required step failed, aborting remaining steps"
                );
                return Ok(Iteration::Aborted);
            }
        }

        Ok(Iteration::Completed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use agentry_types::outcome::StepResult;
    use agentry_types::plan::Step;
    use agentry_types::tool::ToolError;
    use serde_json::json;

    use crate::engine::runner::Invocation;

    /// How a stubbed capability behaves on each call.
    enum Behavior {
        Succeed(Value),
        Partial(Value),
        FailAlways(&'static str),
        /// Fail this many times, then succeed.
        FailTimes(u32, AtomicU32),
    }

    /// Capability-keyed stub backend that logs invocation order.
    struct StubCapabilities {
        behaviors: HashMap<String, Behavior>,
        call_log: Mutex<Vec<String>>,
    }

    impl StubCapabilities {
        fn new(behaviors: Vec<(&str, Behavior)>) -> Self {
            Self {
                behaviors: behaviors
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                call_log: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.call_log.lock().unwrap().clone()
        }
    }

    impl CapabilityExecutor for StubCapabilities {
        async fn execute(
            &self,
            capability: &str,
            _parameters: &serde_json::Map<String, Value>,
            invocation: &Invocation<'_>,
        ) -> Result<StepResult, ToolError> {
            self.call_log
                .lock()
                .unwrap()
                .push(invocation.step_id.to_string());

            match self.behaviors.get(capability) {
                Some(Behavior::Succeed(value)) => Ok(StepResult::success(value.clone())),
                Some(Behavior::Partial(value)) => Ok(StepResult::partial(value.clone())),
                Some(Behavior::FailAlways(message)) => Ok(StepResult::error(*message)),
                Some(Behavior::FailTimes(n, counter)) => {
                    if counter.fetch_add(1, Ordering::SeqCst) < *n {
                        Ok(StepResult::error("transient"))
                    } else {
                        Ok(StepResult::success(json!({"recovered": true})))
                    }
                }
                None => Err(ToolError::UnknownCapability(capability.to_string())),
            }
        }
    }

    fn step(id: &str, capability: &str, depends_on: Vec<&str>, optional: bool) -> Step {
        Step {
            id: id.to_string(),
            capability: capability.to_string(),
            parameters: serde_json::Map::new(),
            description: format!("step {id}"),
            depends_on: depends_on.into_iter().map(String::from).collect(),
            optional,
        }
    }

    fn plan(steps: Vec<Step>) -> Plan {
        Plan {
            id: uuid::Uuid::now_v7(),
            task_description: "test task".to_string(),
            steps,
            estimated_complexity: None,
            required_tools: vec![],
            success_criteria: vec![],
            metadata: HashMap::new(),
        }
    }

    fn retry() -> RetrySettings {
        RetrySettings {
            max_attempts: 3,
            base_delay_ms: 5,
        }
    }

    /// Scenario: step 1 (cap A, required), step 2 (cap B, deps=[1],
    /// required), step 3 (cap C, deps=[1], optional). A and B succeed, C
    /// errors -> overall success with one failed bucket entry.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_optional_failure_does_not_fail_run() {
        let stub = StubCapabilities::new(vec![
            ("cap_a", Behavior::Succeed(json!({"a": 1}))),
            ("cap_b", Behavior::Succeed(json!({"b": 2}))),
            ("cap_c", Behavior::FailAlways("no data")),
        ]);
        let plan = plan(vec![
            step("1", "cap_a", vec![], false),
            step("2", "cap_b", vec!["1"], false),
            step("3", "cap_c", vec!["1"], true),
        ]);

        let executor = PlanExecutor::new(&stub, retry());
        let result = executor.execute(&plan).await;

        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.execution_summary.total_steps, 3);
        assert_eq!(result.execution_summary.successful_steps, 2);
        assert_eq!(result.execution_summary.failed_steps, 1);
        assert_eq!(result.execution_summary.partial_steps, 0);
        assert!(result.error.is_none());

        // Order: 1, then 2, then 3 (the optional failure retries 3x).
        assert_eq!(
            stub.calls(),
            vec!["1", "2", "3", "3", "3"],
            "step 3 consumed its retries"
        );
    }

    /// Scenario: same plan, but A fails terminally. Steps 2 and 3 never
    /// run and have no bucket entries.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_required_failure_aborts_dependents() {
        let stub = StubCapabilities::new(vec![
            ("cap_a", Behavior::FailAlways("service down")),
            ("cap_b", Behavior::Succeed(json!({}))),
            ("cap_c", Behavior::Succeed(json!({}))),
        ]);
        let plan = plan(vec![
            step("1", "cap_a", vec![], false),
            step("2", "cap_b", vec!["1"], false),
            step("3", "cap_c", vec!["1"], true),
        ]);

        let executor = PlanExecutor::new(&stub, retry());
        let result = executor.execute(&plan).await;

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.execution_summary.total_steps, 3);
        assert_eq!(result.execution_summary.successful_steps, 0);
        assert_eq!(result.execution_summary.failed_steps, 1);
        // No entries anywhere for the steps that never ran.
        let bucketed: Vec<&str> = result
            .results
            .successful
            .iter()
            .chain(&result.results.failed)
            .chain(&result.results.partial)
            .map(|r| r.step_id.as_str())
            .collect();
        assert_eq!(bucketed, vec!["1"]);
        // Step 1 retried 3 times; nothing else executed.
        assert_eq!(stub.calls(), vec!["1", "1", "1"]);
        // Individual step errors never set the top-level error.
        assert!(result.error.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_all_success() {
        let stub = StubCapabilities::new(vec![
            ("cap_a", Behavior::Succeed(json!({"x": 1}))),
            ("cap_b", Behavior::Succeed(json!({"y": 2}))),
        ]);
        let plan = plan(vec![
            step("first", "cap_a", vec![], false),
            step("second", "cap_b", vec!["first"], false),
        ]);

        let executor = PlanExecutor::new(&stub, retry());
        let result = executor.execute(&plan).await;

        assert!(result.is_success());
        assert_eq!(result.execution_summary.successful_steps, 2);
        assert_eq!(result.execution_summary.failed_steps, 0);
        assert_eq!(result.data["first"], json!({"x": 1}));
        assert_eq!(result.data["second"], json!({"y": 2}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cycle_fails_with_zero_executions() {
        let stub = StubCapabilities::new(vec![("cap_a", Behavior::Succeed(json!({})))]);
        let plan = plan(vec![
            step("1", "cap_a", vec!["2"], false),
            step("2", "cap_a", vec!["1"], false),
        ]);

        let executor = PlanExecutor::new(&stub, retry());
        let result = executor.execute(&plan).await;

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(stub.calls().is_empty(), "no step may run on a cyclic plan");
        let error = result.error.unwrap();
        assert!(error.contains("circular dependency"), "got: {error}");
        assert_eq!(result.execution_summary.successful_steps, 0);
        assert_eq!(result.execution_summary.failed_steps, 0);
        assert_eq!(
            result.metadata.get(EXECUTION_ERROR_KEY).map(|v| v.is_string()),
            Some(true)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_dependency_fails_before_execution() {
        let stub = StubCapabilities::new(vec![("cap_a", Behavior::Succeed(json!({})))]);
        let plan = plan(vec![step("1", "cap_a", vec!["ghost"], false)]);

        let executor = PlanExecutor::new(&stub, retry());
        let result = executor.execute(&plan).await;

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(stub.calls().is_empty());
        assert!(result.error.unwrap().contains("ghost"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_transitive_dependents_of_optional_failure_are_gated() {
        // 1 (optional) fails; 2 requires 1 -> gated out with no entry;
        // 3 is independent and still runs.
        let stub = StubCapabilities::new(vec![
            ("cap_a", Behavior::FailAlways("flaky")),
            ("cap_b", Behavior::Succeed(json!({}))),
            ("cap_c", Behavior::Succeed(json!({"ok": true}))),
        ]);
        let plan = plan(vec![
            step("1", "cap_a", vec![], true),
            step("2", "cap_b", vec!["1"], false),
            step("3", "cap_c", vec![], false),
        ]);

        let executor = PlanExecutor::new(&stub, retry());
        let result = executor.execute(&plan).await;

        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.execution_summary.failed_steps, 1);
        assert_eq!(result.execution_summary.successful_steps, 1);
        let failed_ids: Vec<&str> = result
            .results
            .failed
            .iter()
            .map(|r| r.step_id.as_str())
            .collect();
        assert_eq!(failed_ids, vec!["1"]);
        assert!(
            !result.data.contains_key("2"),
            "gated step leaves no trace"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_retry_recovery_counts_as_success() {
        let stub = StubCapabilities::new(vec![(
            "cap_flaky",
            Behavior::FailTimes(2, AtomicU32::new(0)),
        )]);
        let plan = plan(vec![step("flaky", "cap_flaky", vec![], false)]);

        let executor = PlanExecutor::new(&stub, retry());
        let result = executor.execute(&plan).await;

        assert!(result.is_success());
        assert_eq!(stub.calls().len(), 3, "two failures plus the recovery");
        assert_eq!(result.data["flaky"], json!({"recovered": true}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_identical_runs_are_deterministic() {
        let make_stub = || {
            StubCapabilities::new(vec![
                ("cap_a", Behavior::Succeed(json!({"v": 1}))),
                ("cap_b", Behavior::Succeed(json!({"v": 2}))),
                ("cap_c", Behavior::FailAlways("down")),
            ])
        };
        let make_plan = || {
            plan(vec![
                step("root", "cap_a", vec![], false),
                step("left", "cap_b", vec!["root"], false),
                step("right", "cap_c", vec!["root"], true),
                step("join", "cap_b", vec!["left"], false),
            ])
        };

        let stub_one = make_stub();
        let first = PlanExecutor::new(&stub_one, retry()).execute(&make_plan()).await;
        let stub_two = make_stub();
        let second = PlanExecutor::new(&stub_two, retry()).execute(&make_plan()).await;

        assert_eq!(stub_one.calls(), stub_two.calls());
        assert_eq!(first.status, second.status);
        assert_eq!(
            first.execution_summary.successful_steps,
            second.execution_summary.successful_steps
        );
        assert_eq!(
            first.execution_summary.failed_steps,
            second.execution_summary.failed_steps
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_plan_metadata_reaches_invocations() {
        struct MetadataProbe {
            seen: Mutex<Option<Value>>,
        }

        impl CapabilityExecutor for MetadataProbe {
            async fn execute(
                &self,
                _capability: &str,
                _parameters: &serde_json::Map<String, Value>,
                invocation: &Invocation<'_>,
            ) -> Result<StepResult, ToolError> {
                *self.seen.lock().unwrap() =
                    invocation.metadata.get("origin").cloned();
                Ok(StepResult::success(json!({})))
            }
        }

        let probe = MetadataProbe {
            seen: Mutex::new(None),
        };
        let mut plan = plan(vec![step("only", "any", vec![], false)]);
        plan.metadata
            .insert("origin".to_string(), json!("cli"));

        let executor = PlanExecutor::new(&probe, retry());
        executor.execute(&plan).await;

        assert_eq!(*probe.seen.lock().unwrap(), Some(json!("cli")));
    }
}
