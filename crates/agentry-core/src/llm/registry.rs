//! Provider registry for runtime provider lookup.

use std::collections::HashMap;

use super::box_provider::BoxLlmProvider;

/// Registry of available LLM providers, indexed by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, BoxLlmProvider>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under the given name, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, provider: BoxLlmProvider) {
        self.providers.insert(name.into(), provider);
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<&BoxLlmProvider> {
        self.providers.get(name)
    }

    /// All registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentry_types::llm::{
        CompletionRequest, CompletionResponse, LlmError, StopReason, Usage,
    };

    use crate::llm::provider::LlmProvider;

    struct NamedProvider(&'static str);

    impl LlmProvider for NamedProvider {
        fn name(&self) -> &str {
            self.0
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                id: "r".to_string(),
                content: String::new(),
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    #[test]
    fn test_register_get_and_names() {
        let mut registry = ProviderRegistry::new();
        registry.register("anthropic", BoxLlmProvider::new(NamedProvider("anthropic")));
        registry.register("openai", BoxLlmProvider::new(NamedProvider("openai")));

        assert_eq!(registry.names(), vec!["anthropic", "openai"]);
        assert_eq!(registry.get("anthropic").map(|p| p.name()), Some("anthropic"));
        assert!(registry.get("bedrock").is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = ProviderRegistry::new();
        registry.register("main", BoxLlmProvider::new(NamedProvider("first")));
        registry.register("main", BoxLlmProvider::new(NamedProvider("second")));

        assert_eq!(registry.names(), vec!["main"]);
        assert_eq!(registry.get("main").map(|p| p.name()), Some("second"));
    }
}
