//! Application state wiring for command handlers.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use agentry_core::llm::BoxLlmProvider;
use agentry_core::tool::ToolRegistry;
use agentry_infra::config::{ApiKeys, load_config};
use agentry_infra::llm::provider_from_config;
use agentry_infra::tools::builtin_registry;
use agentry_types::config::AgentryConfig;

/// Shared state for command handlers: resolved configuration, API keys, and
/// the built-in tool registry.
pub struct AppState {
    pub config: AgentryConfig,
    pub registry: ToolRegistry,
    keys: ApiKeys,
}

impl AppState {
    /// Load configuration and build the tool registry.
    pub fn init(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path).context("failed to load configuration")?;
        let keys = ApiKeys::from_env();
        let registry = builtin_registry(&keys, Duration::from_secs(config.request_timeout_secs));

        Ok(Self {
            config,
            registry,
            keys,
        })
    }

    /// Construct the configured LLM provider and the model to use.
    ///
    /// Deferred past `init` so commands that need no LLM (e.g. `tools`)
    /// work without any provider key.
    pub fn provider(&self) -> Result<(BoxLlmProvider, String)> {
        provider_from_config(&self.config.llm, &self.keys)
            .context("failed to construct LLM provider")
    }
}
