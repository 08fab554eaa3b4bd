//! LlmProvider trait definition.
//!
//! The core abstraction all LLM backends implement. Uses RPITIT for
//! `complete`; implementations live in `agentry-infra` (e.g.
//! `AnthropicProvider`). Streaming is deliberately absent: nothing in the
//! plan/execute/verify pipeline consumes partial output.

use agentry_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Anthropic, OpenAI-compatible).
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
