//! Infrastructure implementations for Agentry.
//!
//! Concrete backends for the ports defined in `agentry-core`: LLM provider
//! HTTP clients (Anthropic, OpenAI-compatible), the built-in API tools
//! (weather, github, news), and configuration loading.

pub mod config;
pub mod llm;
pub mod tools;
