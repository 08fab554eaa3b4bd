//! AnthropicProvider -- concrete [`LlmProvider`] for the Anthropic Messages
//! API.
//!
//! Sends non-streaming requests to `/v1/messages` with the required
//! authentication headers. The API key is wrapped in
//! [`secrecy::SecretString`] and only exposed while building request
//! headers.

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use agentry_core::llm::LlmProvider;
use agentry_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

use super::types::{ApiMessage, MessagesRequest, MessagesResponse};

/// Anthropic Claude LLM provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

// No Debug derive: defense-in-depth against key exposure beyond what
// SecretString already redacts.

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    /// Create a new provider for the given key and default model.
    pub fn new(api_key: SecretString, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            model,
        }
    }

    /// The default model for this provider.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Override the base URL (testing, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request(&self, request: &CompletionRequest) -> MessagesRequest {
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        MessagesRequest {
            model,
            max_tokens: request.max_tokens,
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            system: request.system.clone(),
            temperature: request.temperature,
            stop_sequences: request.stop_sequences.clone(),
        }
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!(
            model = body.model.as_str(),
            messages = body.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                529 => LlmError::Overloaded(error_body),
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let api_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let stop_reason = api_response
            .stop_reason
            .as_deref()
            .and_then(|s| StopReason::from_str(s).ok())
            .unwrap_or(StopReason::EndTurn);

        Ok(CompletionResponse {
            id: api_response.id.clone(),
            content: api_response.text(),
            model: api_response.model.clone(),
            stop_reason,
            usage: Usage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use agentry_types::llm::{Message, MessageRole};

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(
            SecretString::from("sk-ant-test"),
            "claude-sonnet-4-20250514".to_string(),
        )
    }

    #[test]
    fn test_name_and_model() {
        let provider = provider();
        assert_eq!(LlmProvider::name(&provider), "anthropic");
        assert_eq!(provider.model(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_build_request_maps_fields() {
        let provider = provider();
        let request = CompletionRequest {
            model: String::new(),
            messages: vec![
                Message {
                    role: MessageRole::User,
                    content: "plan this".to_string(),
                },
                Message {
                    role: MessageRole::Assistant,
                    content: "ok".to_string(),
                },
            ],
            system: Some("you are a planner".to_string()),
            max_tokens: 2048,
            temperature: Some(0.1),
            stop_sequences: None,
        };

        let body = provider.build_request(&request);
        // Empty request model falls back to the provider default.
        assert_eq!(body.model, "claude-sonnet-4-20250514");
        assert_eq!(body.max_tokens, 2048);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "user");
        assert_eq!(body.messages[1].role, "assistant");
        assert_eq!(body.system.as_deref(), Some("you are a planner"));
    }

    #[test]
    fn test_build_request_keeps_explicit_model() {
        let provider = provider();
        let request = CompletionRequest {
            model: "claude-haiku-4-20250514".to_string(),
            messages: vec![Message::user("hi")],
            system: None,
            max_tokens: 16,
            temperature: None,
            stop_sequences: None,
        };
        assert_eq!(
            provider.build_request(&request).model,
            "claude-haiku-4-20250514"
        );
    }

    #[test]
    fn test_with_base_url() {
        let provider = provider().with_base_url("http://localhost:8080");
        assert_eq!(provider.base_url, "http://localhost:8080");
    }
}
