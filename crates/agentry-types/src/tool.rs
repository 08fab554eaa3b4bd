//! Tool capability declarations and the capability fault taxonomy.
//!
//! A tool advertises its capabilities as data: each `ToolCapability` names
//! an operation and declares its parameters with JSON kinds, so the registry
//! can validate a step's parameter map before dispatching and the planner
//! can show the catalog to the LLM.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Parameter declarations
// ---------------------------------------------------------------------------

/// The JSON kind a tool parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParameterKind {
    /// Whether `value` is of this kind.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ParameterKind::String => value.is_string(),
            ParameterKind::Number => value.is_number(),
            ParameterKind::Boolean => value.is_boolean(),
            ParameterKind::Array => value.is_array(),
            ParameterKind::Object => value.is_object(),
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::String => write!(f, "string"),
            ParameterKind::Number => write!(f, "number"),
            ParameterKind::Boolean => write!(f, "boolean"),
            ParameterKind::Array => write!(f, "array"),
            ParameterKind::Object => write!(f, "object"),
        }
    }
}

/// Declaration of one capability parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParameterKind,
    pub description: String,
    pub required: bool,
    /// Default applied by the tool when the parameter is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Closed set of accepted values, when the parameter is an enum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
}

impl ToolParameter {
    /// A required parameter.
    pub fn required(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
            allowed: None,
        }
    }

    /// An optional parameter.
    pub fn optional(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: None,
            allowed: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Restrict the parameter to a closed set of values.
    pub fn with_allowed(mut self, allowed: Vec<Value>) -> Self {
        self.allowed = Some(allowed);
        self
    }
}

// ---------------------------------------------------------------------------
// Capability declaration
// ---------------------------------------------------------------------------

/// Declaration of a named operation a tool provides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCapability {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    /// Example invocations, shown to the planner.
    #[serde(default)]
    pub examples: Vec<String>,
}

impl ToolCapability {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            examples: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<ToolParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_examples(mut self, examples: Vec<&str>) -> Self {
        self.examples = examples.into_iter().map(String::from).collect();
        self
    }

    /// Validate a parameter map against this declaration.
    ///
    /// Checks that every required parameter is present, that present values
    /// match their declared kind, and that enum-restricted values are in the
    /// allowed set. Unknown extra parameters are accepted and ignored.
    pub fn validate(&self, params: &serde_json::Map<String, Value>) -> Result<(), String> {
        for declared in &self.parameters {
            match params.get(&declared.name) {
                None if declared.required => {
                    return Err(format!("missing required parameter '{}'", declared.name));
                }
                None => {}
                Some(value) => {
                    if !declared.kind.matches(value) {
                        return Err(format!(
                            "parameter '{}' must be a {}",
                            declared.name, declared.kind
                        ));
                    }
                    if let Some(allowed) = &declared.allowed
                        && !allowed.contains(value)
                    {
                        return Err(format!(
                            "parameter '{}' must be one of {}",
                            declared.name,
                            serde_json::to_string(allowed).unwrap_or_default()
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ToolError
// ---------------------------------------------------------------------------

/// Faults raised by capability invocation.
///
/// The step runner treats a raised fault exactly like an Error-status
/// result: it retries, and on the final attempt folds the fault into an
/// Error `StepResult`.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No registered tool provides the requested capability.
    #[error("no tool provides capability '{0}'")]
    UnknownCapability(String),

    /// Parameters failed validation against the capability declaration.
    #[error("invalid parameters for '{capability}': {message}")]
    InvalidParameters { capability: String, message: String },

    /// A required API key is not configured.
    #[error("API key '{0}' is not configured")]
    MissingKey(String),

    /// Transport-level HTTP failure (connection, timeout, ...).
    #[error("http request failed: {0}")]
    Http(String),

    /// The upstream API returned a non-success status.
    #[error("api returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The upstream response could not be decoded.
    #[error("failed to decode response: {0}")]
    Deserialization(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
