//! Planner agent: natural-language task to validated execution plan.
//!
//! The planner shows the LLM the registry's capability catalog and the
//! `PlanDraft` JSON schema, asks for a plan at low temperature, parses the
//! draft, and validates it against the registry before handing it to the
//! caller. A plan that fails validation is an error, not a degraded plan.

use agentry_types::llm::{CompletionRequest, LlmError, Message, MessageRole};
use agentry_types::plan::{Plan, PlanDraft};
use thiserror::Error;

use crate::llm::BoxLlmProvider;
use crate::plan::{PlanError, validate_plan};
use crate::tool::ToolRegistry;

use super::extract_json;

/// Errors from plan creation.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("planner returned invalid JSON: {0}")]
    InvalidJson(String),

    #[error("planner produced an invalid plan: {0}")]
    Invalid(#[from] PlanError),
}

/// Creates execution plans from natural-language tasks.
pub struct Planner {
    provider: BoxLlmProvider,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl Planner {
    pub fn new(provider: BoxLlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.1,
            max_tokens: 4096,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Create a validated plan for `task` from the registry's capabilities.
    pub async fn create_plan(
        &self,
        task: &str,
        registry: &ToolRegistry,
    ) -> Result<Plan, PlannerError> {
        let content = format!("Create an execution plan for this task: {task}");
        let plan = self.request_plan(content, registry).await?;

        tracing::info!(
            plan_id = %plan.id,
            steps = plan.steps.len(),
            "plan created"
        );
        Ok(plan)
    }

    /// Refine an existing plan based on feedback, producing a new plan.
    pub async fn refine_plan(
        &self,
        plan: &Plan,
        feedback: &str,
        registry: &ToolRegistry,
    ) -> Result<Plan, PlannerError> {
        let current = serde_json::to_string_pretty(plan)
            .map_err(|e| PlannerError::InvalidJson(e.to_string()))?;
        let content = format!(
            "Refine the following execution plan so it addresses the feedback.\n\
             \n\
             Current plan:\n{current}\n\
             \n\
             Feedback: {feedback}\n\
             \n\
             Respond with the complete refined plan."
        );

        self.request_plan(content, registry).await
    }

    async fn request_plan(
        &self,
        content: String,
        registry: &ToolRegistry,
    ) -> Result<Plan, PlannerError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: MessageRole::User,
                content,
            }],
            system: Some(self.system_prompt(registry)),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            stop_sequences: None,
        };

        let response = self.provider.complete(&request).await?;
        let draft: PlanDraft = serde_json::from_str(extract_json(&response.content))
            .map_err(|e| PlannerError::InvalidJson(e.to_string()))?;

        let plan = Plan::from_draft(draft);
        validate_plan(&plan, registry)?;
        Ok(plan)
    }

    fn system_prompt(&self, registry: &ToolRegistry) -> String {
        let catalog = serde_json::to_string_pretty(&registry.catalog())
            .unwrap_or_else(|_| "[]".to_string());
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(PlanDraft))
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            "You are a planning agent that converts natural-language tasks into \
             structured execution plans.\n\
             \n\
             Break the task into steps, map each step to exactly one of the \
             available capabilities, and connect steps with depends_on edges \
             where one step needs another's output.\n\
             \n\
             Available capabilities:\n{catalog}\n\
             \n\
             Guidelines:\n\
             - give every step a short kebab-case id, unique within the plan\n\
             - include every required parameter for the chosen capability\n\
             - mark steps optional when the task can succeed without them\n\
             - dependencies must form no cycles\n\
             - state concrete success criteria\n\
             \n\
             Respond with a single JSON object matching this schema:\n{schema}\n\
             \n\
             Do not include any text outside the JSON object."
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
