//! Observability utilities for Agentry.

pub mod tracing_setup;
