//! LLM provider port and type-erased wrappers.
//!
//! - `provider` -- the `LlmProvider` trait every backend implements
//! - `box_provider` -- object-safe `BoxLlmProvider` for runtime selection
//! - `registry` -- name-indexed provider registry

pub mod box_provider;
pub mod provider;
pub mod registry;

pub use box_provider::BoxLlmProvider;
pub use provider::LlmProvider;
pub use registry::ProviderRegistry;
