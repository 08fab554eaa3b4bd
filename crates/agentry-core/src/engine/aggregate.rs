//! Partition recorded step results into the final execution report.

use agentry_types::outcome::{
    ExecutionResult, ExecutionStatus, ExecutionSummary, ResultBuckets, StepReport, StepStatus,
};
use agentry_types::plan::Plan;
use chrono::Utc;

use super::context::ExecutionContext;

/// Build the final [`ExecutionResult`] from a run's context.
///
/// Buckets follow plan declaration order, so identical inputs always produce
/// identical reports. Steps with no recorded result (gated out, or behind an
/// abort) contribute nothing anywhere. `total_execution_time` is the sum of
/// recorded durations; a missing duration counts as zero. The top-level
/// `error` is set only by the engine boundary, never for step failures.
pub fn aggregate(
    plan: &Plan,
    ctx: &ExecutionContext,
    status: ExecutionStatus,
    error: Option<String>,
) -> ExecutionResult {
    let mut buckets = ResultBuckets::default();
    let mut data = serde_json::Map::new();
    let mut total_execution_time = 0.0f64;

    for step in &plan.steps {
        let Some(result) = ctx.result(&step.id) else {
            continue;
        };

        total_execution_time += result.execution_time.unwrap_or(0.0);

        if let Some(payload) = &result.data
            && !payload.is_null()
        {
            data.insert(step.id.clone(), payload.clone());
        }

        let report = StepReport {
            step_id: step.id.clone(),
            description: step.description.clone(),
            capability: step.capability.clone(),
            execution_time: None,
            error: None,
            data: None,
        };

        match result.status {
            StepStatus::Success => buckets.successful.push(StepReport {
                execution_time: result.execution_time,
                ..report
            }),
            StepStatus::Partial => buckets.partial.push(StepReport {
                execution_time: result.execution_time,
                data: result.data.clone(),
                ..report
            }),
            StepStatus::Error => buckets.failed.push(StepReport {
                error: result.error.clone(),
                ..report
            }),
        }
    }

    let execution_summary = ExecutionSummary {
        total_steps: plan.steps.len(),
        successful_steps: buckets.successful.len(),
        failed_steps: buckets.failed.len(),
        partial_steps: buckets.partial.len(),
        total_execution_time,
    };

    ExecutionResult {
        run_id: ctx.run_id,
        status,
        task_description: plan.task_description.clone(),
        execution_summary,
        results: buckets,
        data,
        metadata: ctx.metadata.clone(),
        error,
        started_at: ctx.started_at,
        finished_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
