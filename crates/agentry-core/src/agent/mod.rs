//! Planning and verification agents.
//!
//! Both agents drive an LLM to produce structured JSON: the planner turns a
//! task into a `PlanDraft`, the verifier assesses an `ExecutionResult`. The
//! schemas in their prompts are derived from the target types with schemars.

pub mod planner;
pub mod verifier;

pub use planner::Planner;
pub use verifier::Verifier;

/// Extract the JSON body from an LLM response.
///
/// Models occasionally wrap JSON in Markdown code fences or add a leading
/// sentence despite instructions; this trims to the outermost braces.
/// Returns the trimmed input unchanged when no braces are found (the
/// subsequent parse produces the real error).
pub(crate) fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
