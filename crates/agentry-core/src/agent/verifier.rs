//! Verifier agent: quality assessment and output formatting.
//!
//! Two LLM passes over a finished run: `assess` judges the execution result
//! against the original task and the plan's success criteria, producing a
//! `VerificationReport`; `format_output` turns the raw result into
//! user-facing output. When formatting fails, a deterministic local fallback
//! is used instead -- verification never leaves the caller empty-handed over
//! a formatting hiccup.

use agentry_types::llm::{CompletionRequest, LlmError, Message, MessageRole};
use agentry_types::outcome::ExecutionResult;
use agentry_types::plan::Plan;
use agentry_types::verify::{VerificationReport, VerifiedOutcome};
use serde_json::{Value, json};
use thiserror::Error;

use crate::llm::BoxLlmProvider;

use super::extract_json;

/// Errors from result verification.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("verifier returned invalid JSON: {0}")]
    InvalidJson(String),

    #[error("failed to serialize execution result: {0}")]
    Serialize(String),
}

/// Validates execution results and produces user-facing output.
pub struct Verifier {
    provider: BoxLlmProvider,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl Verifier {
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

    /// Verify `outcome` against the task and format the final output.
    pub async fn verify(
        &self,
        task: &str,
        plan: &Plan,
        outcome: &ExecutionResult,
    ) -> Result<VerifiedOutcome, VerifierError> {
        let report = self.assess(task, plan, outcome).await?;

        if !report.passed() {
            tracing::warn!(
                quality_score = report.quality_score,
                issues = report.issues.len(),
                "verification flagged the execution result"
            );
        }

        let final_output = match self.format_output(task, outcome, &report).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(error = %err, "output formatting failed, using fallback");
                fallback_output(task, outcome, &report)
            }
        };

        let success = report.is_complete && report.is_accurate;
        Ok(VerifiedOutcome {
            verification: report,
            final_output,
            original_task: task.to_string(),
            success,
        })
    }

    async fn assess(
        &self,
        task: &str,
        plan: &Plan,
        outcome: &ExecutionResult,
    ) -> Result<VerificationReport, VerifierError> {
        let result_json = serde_json::to_string_pretty(outcome)
            .map_err(|e| VerifierError::Serialize(e.to_string()))?;
        let criteria = serde_json::to_string_pretty(&plan.success_criteria)
            .map_err(|e| VerifierError::Serialize(e.to_string()))?;
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(VerificationReport))
            .unwrap_or_else(|_| "{}".to_string());

        let content = format!(
            "Verify the execution results for this task.\n\
             \n\
             Original task: {task}\n\
             \n\
             Success criteria:\n{criteria}\n\
             \n\
             Execution results:\n{result_json}\n\
             \n\
             Judge whether the task was completed, whether the results look \
             accurate, what critical information is missing, and what could \
             be improved.\n\
             \n\
             Respond with a single JSON object matching this schema:\n{schema}\n\
             \n\
             Do not include any text outside the JSON object."
        );

        let system = "You are a verification agent responsible for judging the \
                      quality and completeness of execution results. Be thorough \
                      but fair: check the success criteria, the accuracy of the \
                      data, and any gaps or inconsistencies."
            .to_string();

        let response = self.complete(content, Some(system)).await?;
        serde_json::from_str(extract_json(&response))
            .map_err(|e| VerifierError::InvalidJson(e.to_string()))
    }

    async fn format_output(
        &self,
        task: &str,
        outcome: &ExecutionResult,
        report: &VerificationReport,
    ) -> Result<Value, VerifierError> {
        let data = serde_json::to_string_pretty(&outcome.data)
            .map_err(|e| VerifierError::Serialize(e.to_string()))?;
        let issues = serde_json::to_string_pretty(&report.issues)
            .map_err(|e| VerifierError::Serialize(e.to_string()))?;

        let content = format!(
            "Format the final output for this task as a clean response for \
             the user.\n\
             \n\
             Original task: {task}\n\
             \n\
             Collected data:\n{data}\n\
             \n\
             Known issues:\n{issues}\n\
             \n\
             Respond with a single JSON object with the keys: \"summary\" \
             (string, directly answers the task), \"details\" (object with \
             the key information), \"sources\" (array of strings), and \
             \"limitations\" (array of strings). Do not include any text \
             outside the JSON object."
        );

        let system = "You are an output formatter. Produce clear, honest, \
                      well-organized responses that directly answer the user's \
                      original question and acknowledge limitations."
            .to_string();

        let response = self.complete(content, Some(system)).await?;
        serde_json::from_str(extract_json(&response))
            .map_err(|e| VerifierError::InvalidJson(e.to_string()))
    }

    async fn complete(
        &self,
        content: String,
        system: Option<String>,
    ) -> Result<String, VerifierError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: MessageRole::User,
                content,
            }],
            system,
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            stop_sequences: None,
        };
        Ok(self.provider.complete(&request).await?.content)
    }
}

/// Deterministic local fallback when LLM formatting fails.
fn fallback_output(task: &str, outcome: &ExecutionResult, report: &VerificationReport) -> Value {
    json!({
        "summary": format!("Results for: {task}"),
        "details": outcome.data,
        "sources": [],
        "limitations": report.issues,
        "confidence": if report.quality_score > 0.5 { "medium" } else { "low" },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
