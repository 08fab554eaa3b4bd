//! Execution engine and agent logic for Agentry.
//!
//! This crate defines the "ports" (`CapabilityExecutor`, `Tool`,
//! `LlmProvider`) that the infrastructure layer implements, plus everything
//! with algorithmic structure: dependency-ordered plan execution, retry
//! handling, result aggregation, plan validation, and the planner/verifier
//! agents. It depends only on `agentry-types` -- never on HTTP or IO crates.

pub mod agent;
pub mod engine;
pub mod llm;
pub mod plan;
pub mod tool;
