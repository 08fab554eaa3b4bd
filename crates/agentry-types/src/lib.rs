//! Shared domain types for Agentry.
//!
//! This crate contains the core domain types used across the Agentry runtime:
//! plans and steps, execution outcomes, tool capability declarations, LLM
//! request/response shapes, and configuration.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror,
//! and schemars.

pub mod config;
pub mod llm;
pub mod outcome;
pub mod plan;
pub mod tool;
pub mod verify;
