//! Single-step execution with bounded retry and linear backoff.
//!
//! `StepRunner` drives one capability invocation at a time through a
//! [`CapabilityExecutor`]. An Error-status result and a raised [`ToolError`]
//! are treated identically: both consume an attempt and, if attempts remain,
//! trigger a backoff sleep of `base_delay * attempt` before the next try.
//! Success and Partial return immediately.

use std::collections::HashMap;
use std::time::Instant;

use agentry_types::config::RetrySettings;
use agentry_types::outcome::StepResult;
use agentry_types::plan::Step;
use agentry_types::tool::ToolError;
use serde_json::Value;

use super::context::ExecutionContext;

// ---------------------------------------------------------------------------
// CapabilityExecutor
// ---------------------------------------------------------------------------

/// Execution metadata passed alongside every capability invocation.
#[derive(Debug)]
pub struct Invocation<'a> {
    /// Id of the step being executed.
    pub step_id: &'a str,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Results of the steps executed so far this run.
    pub prior_results: &'a HashMap<String, StepResult>,
    /// Plan-level metadata from the execution context.
    pub metadata: &'a HashMap<String, Value>,
}

/// The named-operation boundary the engine drives.
///
/// Given a capability name, a parameter map, and the invocation metadata,
/// an implementation returns a [`StepResult`] or raises a [`ToolError`]
/// (which the runner treats exactly like an Error-status result). The
/// production implementation is the tool registry; tests substitute scripted
/// stubs.
pub trait CapabilityExecutor: Send + Sync {
    fn execute(
        &self,
        capability: &str,
        parameters: &serde_json::Map<String, Value>,
        invocation: &Invocation<'_>,
    ) -> impl std::future::Future<Output = Result<StepResult, ToolError>> + Send;
}

impl<E: CapabilityExecutor> CapabilityExecutor for &E {
    fn execute(
        &self,
        capability: &str,
        parameters: &serde_json::Map<String, Value>,
        invocation: &Invocation<'_>,
    ) -> impl std::future::Future<Output = Result<StepResult, ToolError>> + Send {
        (**self).execute(capability, parameters, invocation)
    }
}

// ---------------------------------------------------------------------------
// StepRunner
// ---------------------------------------------------------------------------

/// Executes one step at a time with bounded retry.
#[derive(Debug, Clone)]
pub struct StepRunner {
    retry: RetrySettings,
}

impl StepRunner {
    pub fn new(retry: RetrySettings) -> Self {
        Self { retry }
    }

    /// Execute `step` and return its result.
    ///
    /// Never fails: a fault raised on the final attempt is folded into an
    /// Error result describing the exhausted retries. The reported
    /// `execution_time` spans every attempt, backoff sleeps included.
    pub async fn run<E: CapabilityExecutor>(
        &self,
        executor: &E,
        step: &Step,
        ctx: &ExecutionContext,
    ) -> StepResult {
        let max_attempts = self.retry.max_attempts.max(1);
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let invocation = Invocation {
                step_id: &step.id,
                attempt,
                prior_results: ctx.results(),
                metadata: &ctx.metadata,
            };

            let outcome = executor
                .execute(&step.capability, &step.parameters, &invocation)
                .await;

            match outcome {
                Ok(result) if !result.status.is_error() => {
                    tracing::debug!(
                        step_id = step.id.as_str(),
                        attempt,
                        status = %result.status,
                        "step completed"
                    );
                    return result.with_execution_time(started.elapsed().as_secs_f64());
                }
                Ok(result) if attempt >= max_attempts => {
                    return result.with_execution_time(started.elapsed().as_secs_f64());
                }
                Ok(result) => {
                    tracing::debug!(
                        step_id = step.id.as_str(),
                        attempt,
                        error = result.error.as_deref().unwrap_or(""),
                        "step attempt returned error, backing off"
                    );
                }
                Err(fault) if attempt >= max_attempts => {
                    return StepResult::error(format!(
                        "step execution failed after {max_attempts} attempts: {fault}"
                    ))
                    .with_execution_time(started.elapsed().as_secs_f64());
                }
                Err(fault) => {
                    tracing::debug!(
                        step_id = step.id.as_str(),
                        attempt,
                        fault = %fault,
                        "capability fault, backing off"
                    );
                }
            }

            tokio::time::sleep(self.retry.base_delay() * attempt).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
