//! Tool registry: name-indexed tools with capability dispatch.
//!
//! The registry is the production [`CapabilityExecutor`]: it resolves a
//! capability name to the owning tool, validates the parameter map against
//! the capability declaration, and dispatches. It also produces the
//! capability catalog the planner embeds in its prompt.

use std::collections::HashMap;

use agentry_types::outcome::StepResult;
use agentry_types::tool::{ToolCapability, ToolError};
use serde_json::{Value, json};

use crate::engine::runner::{CapabilityExecutor, Invocation};

use super::{BoxTool, Tool};

/// Registry of available tools, with a capability -> tool index.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, BoxTool>,
    capability_index: HashMap<String, String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, indexing its capabilities for dispatch.
    ///
    /// On capability-name collisions the later registration wins.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let boxed = BoxTool::new(tool);
        for capability in boxed.capabilities() {
            self.capability_index
                .insert(capability.name.clone(), boxed.name().to_string());
        }
        self.tools.insert(boxed.name().to_string(), boxed);
    }

    /// Look up a tool by name.
    pub fn tool(&self, name: &str) -> Option<&BoxTool> {
        self.tools.get(name)
    }

    /// The tool providing a capability.
    pub fn tool_for_capability(&self, capability: &str) -> Option<&BoxTool> {
        self.tools.get(self.capability_index.get(capability)?)
    }

    /// A capability declaration by name.
    pub fn capability(&self, name: &str) -> Option<&ToolCapability> {
        self.tool_for_capability(name)?
            .capabilities()
            .iter()
            .find(|c| c.name == name)
    }

    /// Registered tool names, sorted.
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All capability names, sorted.
    pub fn capability_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.capability_index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// JSON capability catalog for the planner prompt (and the CLI).
    ///
    /// One entry per capability, grouped under stable tool order.
    pub fn catalog(&self) -> Value {
        let mut entries = Vec::new();
        for tool_name in self.tool_names() {
            let tool = &self.tools[tool_name];
            for capability in tool.capabilities() {
                entries.push(json!({
                    "name": capability.name,
                    "description": capability.description,
                    "tool": tool_name,
                    "parameters": capability.parameters,
                    "examples": capability.examples,
                }));
            }
        }
        Value::Array(entries)
    }
}

impl CapabilityExecutor for ToolRegistry {
    async fn execute(
        &self,
        capability: &str,
        parameters: &serde_json::Map<String, Value>,
        invocation: &Invocation<'_>,
    ) -> Result<StepResult, ToolError> {
        let tool = self
            .tool_for_capability(capability)
            .ok_or_else(|| ToolError::UnknownCapability(capability.to_string()))?;

        let declaration = tool
            .capabilities()
            .iter()
            .find(|c| c.name == capability)
            .ok_or_else(|| ToolError::UnknownCapability(capability.to_string()))?;

        declaration
            .validate(parameters)
            .map_err(|message| ToolError::InvalidParameters {
                capability: capability.to_string(),
                message,
            })?;

        tracing::debug!(
            capability,
            tool = tool.name(),
            step_id = invocation.step_id,
            attempt = invocation.attempt,
            "dispatching capability"
        );

        tool.execute(capability, parameters, invocation).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
