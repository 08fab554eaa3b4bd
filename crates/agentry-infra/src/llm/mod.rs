//! LLM provider implementations and selection.

pub mod anthropic;
pub mod openai_compat;

pub use anthropic::AnthropicProvider;
pub use openai_compat::OpenAiCompatProvider;

use agentry_core::llm::BoxLlmProvider;
use agentry_types::config::LlmSettings;
use agentry_types::llm::ProviderKind;
use thiserror::Error;

use crate::config::ApiKeys;

/// Errors from provider selection.
#[derive(Debug, Error)]
pub enum ProviderSetupError {
    #[error("no API key configured for provider '{0}'")]
    MissingKey(ProviderKind),

    #[error("no LLM provider configured (set ANTHROPIC_API_KEY or OPENAI_API_KEY)")]
    NoProvider,
}

/// Select and construct a provider from settings and available keys.
///
/// An explicit `provider` setting wins; otherwise Anthropic is preferred
/// when both keys are present. Returns the boxed provider together with the
/// model name to use for requests.
pub fn provider_from_config(
    settings: &LlmSettings,
    keys: &ApiKeys,
) -> Result<(BoxLlmProvider, String), ProviderSetupError> {
    let kind = match settings.provider {
        Some(kind) => kind,
        None if keys.anthropic.is_some() => ProviderKind::Anthropic,
        None if keys.openai.is_some() => ProviderKind::OpenAiCompat,
        None => return Err(ProviderSetupError::NoProvider),
    };

    match kind {
        ProviderKind::Anthropic => {
            let key = keys
                .anthropic
                .clone()
                .ok_or(ProviderSetupError::MissingKey(kind))?;
            let model = settings.anthropic_model.clone();
            let provider = AnthropicProvider::new(key, model.clone());
            Ok((BoxLlmProvider::new(provider), model))
        }
        ProviderKind::OpenAiCompat => {
            let key = keys
                .openai
                .clone()
                .ok_or(ProviderSetupError::MissingKey(kind))?;
            let model = settings.openai_model.clone();
            let provider =
                OpenAiCompatProvider::new(&key, &settings.openai_base_url, model.clone());
            Ok((BoxLlmProvider::new(provider), model))
        }
    }
}
