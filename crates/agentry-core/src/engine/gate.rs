//! Step eligibility decision.

use agentry_types::plan::Step;

use super::context::ExecutionContext;

/// Decide whether `step` may run given the results recorded so far.
///
/// A step is blocked when a dependency has no recorded result (it was gated
/// out earlier -- or, defensively, never visited), or when a dependency
/// failed and the step itself is required. An optional step is never blocked
/// by a failed dependency: it is always attempted. Pure function, no side
/// effects.
pub fn is_eligible(step: &Step, ctx: &ExecutionContext) -> bool {
    for dep in &step.depends_on {
        match ctx.result(dep) {
            None => return false,
            Some(result) if result.status.is_error() && !step.optional => return false,
            Some(_) => {}
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
