//! Built-in API tools: weather (OpenWeatherMap), github (GitHub REST v3),
//! and news (NewsAPI).
//!
//! Every tool declares its capabilities with typed parameters, shares one
//! `reqwest::Client`, and raises [`ToolError`](agentry_types::tool::ToolError)
//! faults for transport and API failures -- the engine's retry loop handles
//! both the same way as Error-status results.

pub mod github;
pub mod news;
pub mod weather;

pub use github::GithubTool;
pub use news::NewsTool;
pub use weather::WeatherTool;

use std::time::Duration;

use agentry_core::tool::ToolRegistry;
use serde_json::Value;

use crate::config::ApiKeys;

/// Build the registry of built-in tools.
///
/// All tools share a single HTTP client configured with `request_timeout`
/// and the crate user agent (GitHub rejects requests without one).
pub fn builtin_registry(keys: &ApiKeys, request_timeout: Duration) -> ToolRegistry {
    let client = reqwest::Client::builder()
        .timeout(request_timeout)
        .user_agent(concat!("agentry/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to create reqwest client");

    let mut registry = ToolRegistry::new();
    registry.register(WeatherTool::new(client.clone(), keys.weather.clone()));
    registry.register(GithubTool::new(client.clone(), keys.github.clone()));
    registry.register(NewsTool::new(client, keys.news.clone()));
    registry
}

// ---------------------------------------------------------------------------
// Parameter helpers
// ---------------------------------------------------------------------------

/// A string parameter, if present.
pub(crate) fn str_param<'a>(
    params: &'a serde_json::Map<String, Value>,
    name: &str,
) -> Option<&'a str> {
    params.get(name).and_then(Value::as_str)
}

/// A numeric parameter, if present.
pub(crate) fn f64_param(params: &serde_json::Map<String, Value>, name: &str) -> Option<f64> {
    params.get(name).and_then(Value::as_f64)
}

/// An integer parameter clamped to `max`, falling back to `default`.
pub(crate) fn capped_count(
    params: &serde_json::Map<String, Value>,
    name: &str,
    default: u64,
    max: u64,
) -> u64 {
    params
        .get(name)
        .and_then(Value::as_u64)
        .unwrap_or(default)
        .min(max)
}
