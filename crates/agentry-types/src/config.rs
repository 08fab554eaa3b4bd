//! Runtime configuration types.
//!
//! `AgentryConfig` represents the `agentry.toml` file. Every field has a
//! default, so an empty (or missing) file is valid. Settings are loaded once
//! at startup and passed in explicitly -- no component reads the environment
//! during execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llm::ProviderKind;

// ---------------------------------------------------------------------------
// AgentryConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for the Agentry runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentryConfig {
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    /// HTTP timeout for tool API requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// LlmSettings
// ---------------------------------------------------------------------------

/// LLM provider selection and model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Explicit provider choice. When unset, the provider is picked from
    /// whichever API key is configured (Anthropic preferred).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,

    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Sampling temperature for plan generation.
    #[serde(default = "default_agent_temperature")]
    pub planner_temperature: f64,

    /// Sampling temperature for result verification.
    #[serde(default = "default_agent_temperature")]
    pub verifier_temperature: f64,

    /// Completion token cap for planner and verifier calls.
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_agent_temperature() -> f64 {
    0.1
}

fn default_max_completion_tokens() -> u32 {
    4096
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: None,
            anthropic_model: default_anthropic_model(),
            openai_model: default_openai_model(),
            openai_base_url: default_openai_base_url(),
            planner_temperature: default_agent_temperature(),
            verifier_temperature: default_agent_temperature(),
            max_completion_tokens: default_max_completion_tokens(),
        }
    }
}

// ---------------------------------------------------------------------------
// RetrySettings
// ---------------------------------------------------------------------------

/// Retry policy for step execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum attempts per step.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds. Attempt `n` sleeps
    /// `n * base_delay_ms` before the next attempt (linear backoff).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetrySettings {
    /// The base backoff delay as a `Duration`.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
