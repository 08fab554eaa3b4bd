//! Tool abstraction: named API integrations exposing typed capabilities.
//!
//! A `Tool` advertises its capabilities as data and executes them on demand.
//! `Tool` uses RPITIT for its async method, so it is not object-safe;
//! [`BoxTool`] provides the type-erased wrapper the registry stores
//! (object-safe `ToolDyn` trait with boxed futures, blanket-implemented for
//! every `Tool`).

pub mod registry;

pub use registry::ToolRegistry;

use std::future::Future;
use std::pin::Pin;

use agentry_types::outcome::StepResult;
use agentry_types::tool::{ToolCapability, ToolError};
use serde_json::Value;

use crate::engine::runner::Invocation;

// ---------------------------------------------------------------------------
// Tool trait
// ---------------------------------------------------------------------------

/// An external API integration exposing one or more named capabilities.
///
/// Implementations live in `agentry-infra`. A tool may return an
/// Error-status [`StepResult`] (the upstream answered, unhelpfully) or raise
/// a [`ToolError`] (the call itself failed); the engine treats both the same
/// way for retry purposes.
pub trait Tool: Send + Sync {
    /// Unique tool name (e.g. "weather").
    fn name(&self) -> &str;

    /// One-line tool description, surfaced to the planner.
    fn description(&self) -> &str;

    /// The capabilities this tool provides.
    fn capabilities(&self) -> &[ToolCapability];

    /// Execute one capability. Parameters have already been validated
    /// against the capability declaration by the registry.
    fn execute(
        &self,
        capability: &str,
        parameters: &serde_json::Map<String, Value>,
        invocation: &Invocation<'_>,
    ) -> impl std::future::Future<Output = Result<StepResult, ToolError>> + Send;
}

// ---------------------------------------------------------------------------
// BoxTool
// ---------------------------------------------------------------------------

/// Object-safe version of [`Tool`] with a boxed future.
///
/// Exists solely to enable dynamic dispatch; blanket-implemented for every
/// `Tool`.
trait ToolDyn: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn capabilities(&self) -> &[ToolCapability];

    fn execute_boxed<'a>(
        &'a self,
        capability: &'a str,
        parameters: &'a serde_json::Map<String, Value>,
        invocation: &'a Invocation<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<StepResult, ToolError>> + Send + 'a>>;
}

impl<T: Tool> ToolDyn for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn description(&self) -> &str {
        Tool::description(self)
    }

    fn capabilities(&self) -> &[ToolCapability] {
        Tool::capabilities(self)
    }

    fn execute_boxed<'a>(
        &'a self,
        capability: &'a str,
        parameters: &'a serde_json::Map<String, Value>,
        invocation: &'a Invocation<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<StepResult, ToolError>> + Send + 'a>> {
        Box::pin(self.execute(capability, parameters, invocation))
    }
}

/// Type-erased tool for registry storage.
pub struct BoxTool {
    inner: Box<dyn ToolDyn>,
}

impl BoxTool {
    /// Wrap a concrete tool in a type-erased box.
    pub fn new<T: Tool + 'static>(tool: T) -> Self {
        Self {
            inner: Box::new(tool),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn description(&self) -> &str {
        self.inner.description()
    }

    pub fn capabilities(&self) -> &[ToolCapability] {
        self.inner.capabilities()
    }

    /// Execute one capability through dynamic dispatch.
    pub async fn execute(
        &self,
        capability: &str,
        parameters: &serde_json::Map<String, Value>,
        invocation: &Invocation<'_>,
    ) -> Result<StepResult, ToolError> {
        self.inner
            .execute_boxed(capability, parameters, invocation)
            .await
    }
}
