//! Execution plan types.
//!
//! A `Plan` is the dependency-ordered set of steps the engine executes. The
//! planner asks the LLM for a `PlanDraft` (the schema embedded in its prompt
//! is derived from that type) and promotes it to a `Plan` by assigning a run
//! identifier. Plans are immutable once constructed; the engine only reads
//! them.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// A single unit of work in an execution plan.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Step {
    /// Step identifier, unique within a plan (e.g. "fetch-weather").
    pub id: String,
    /// Name of the capability this step invokes.
    pub capability: String,
    /// Parameters passed to the capability.
    #[serde(default)]
    pub parameters: serde_json::Map<String, Value>,
    /// What this step accomplishes, in plain language.
    pub description: String,
    /// Ids of steps that must complete before this one runs.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Whether the run may continue if this step fails.
    #[serde(default)]
    pub optional: bool,
}

// ---------------------------------------------------------------------------
// PlanDraft (LLM-facing shape)
// ---------------------------------------------------------------------------

/// Estimated effort of a plan, as judged by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlanComplexity {
    Simple,
    Moderate,
    Complex,
}

/// The plan shape the planner asks the LLM to produce.
///
/// Identical to [`Plan`] minus the fields the LLM must not invent (the plan
/// id and runtime metadata). [`Plan::from_draft`] does the promotion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlanDraft {
    /// The original task, restated.
    pub task_description: String,
    /// Ordered list of steps forming the dependency graph.
    pub steps: Vec<Step>,
    /// Complexity estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_complexity: Option<PlanComplexity>,
    /// Names of the tools this plan requires.
    #[serde(default)]
    pub required_tools: Vec<String>,
    /// Criteria for judging the run successful. Opaque to the engine;
    /// passed through to the verifier.
    #[serde(default)]
    pub success_criteria: Vec<String>,
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A complete execution plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// UUIDv7 assigned when the draft is promoted (or when a plan file is
    /// loaded without one).
    #[serde(default = "Uuid::now_v7")]
    pub id: Uuid,
    /// The original task description.
    pub task_description: String,
    /// Ordered list of steps forming the dependency graph.
    pub steps: Vec<Step>,
    /// Complexity estimate from the planner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_complexity: Option<PlanComplexity>,
    /// Names of the tools this plan requires.
    #[serde(default)]
    pub required_tools: Vec<String>,
    /// Success criteria, passed through to the verifier unchanged.
    #[serde(default)]
    pub success_criteria: Vec<String>,
    /// Plan-level metadata, made available to every capability invocation.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Plan {
    /// Promote an LLM-produced draft to a full plan with a fresh id.
    pub fn from_draft(draft: PlanDraft) -> Self {
        Self {
            id: Uuid::now_v7(),
            task_description: draft.task_description,
            steps: draft.steps,
            estimated_complexity: draft.estimated_complexity,
            required_tools: draft.required_tools,
            success_criteria: draft.success_criteria,
            metadata: HashMap::new(),
        }
    }

    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
