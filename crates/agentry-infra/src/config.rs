//! Configuration loading: `agentry.toml` plus environment overrides.
//!
//! Settings are resolved once at startup: file values (all optional) are
//! overridden by `AGENTRY_*` environment variables, and API keys are pulled
//! from their conventional variables into [`secrecy::SecretString`]s. No
//! component reads the environment after this.

use std::path::Path;

use agentry_types::config::AgentryConfig;
use secrecy::SecretString;
use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("invalid {variable}: {message}")]
    InvalidOverride { variable: String, message: String },
}

// ---------------------------------------------------------------------------
// API keys
// ---------------------------------------------------------------------------

/// API keys for LLM providers and tools.
///
/// Each key is optional; components that need a missing key fail with a
/// descriptive error at use, not at startup. Keys are wrapped in
/// `SecretString` so they never appear in Debug output or logs.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub anthropic: Option<SecretString>,
    pub openai: Option<SecretString>,
    pub github: Option<SecretString>,
    pub weather: Option<SecretString>,
    pub news: Option<SecretString>,
}

impl ApiKeys {
    /// Read all keys from the conventional environment variables.
    pub fn from_env() -> Self {
        Self {
            anthropic: secret_var("ANTHROPIC_API_KEY"),
            openai: secret_var("OPENAI_API_KEY"),
            github: secret_var("GITHUB_TOKEN"),
            weather: secret_var("WEATHER_API_KEY"),
            news: secret_var("NEWS_API_KEY"),
        }
    }
}

fn secret_var(name: &str) -> Option<SecretString> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load configuration from an optional TOML file, then apply environment
/// overrides.
pub fn load_config(path: Option<&Path>) -> Result<AgentryConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)?;
            toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
        None => AgentryConfig::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Apply `AGENTRY_*` overrides from a variable lookup.
///
/// Factored out of [`load_config`] so tests can inject variables without
/// mutating the process environment.
fn apply_overrides<F>(config: &mut AgentryConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("AGENTRY_PROVIDER") {
        config.llm.provider =
            Some(
                value
                    .parse()
                    .map_err(|message: String| ConfigError::InvalidOverride {
                        variable: "AGENTRY_PROVIDER".to_string(),
                        message,
                    })?,
            );
    }
    if let Some(value) = lookup("AGENTRY_ANTHROPIC_MODEL") {
        config.llm.anthropic_model = value;
    }
    if let Some(value) = lookup("AGENTRY_OPENAI_MODEL") {
        config.llm.openai_model = value;
    }
    if let Some(value) = lookup("AGENTRY_OPENAI_BASE_URL") {
        config.llm.openai_base_url = value;
    }
    if let Some(value) = lookup("AGENTRY_MAX_ATTEMPTS") {
        config.retry.max_attempts = parse_override("AGENTRY_MAX_ATTEMPTS", &value)?;
    }
    if let Some(value) = lookup("AGENTRY_BASE_DELAY_MS") {
        config.retry.base_delay_ms = parse_override("AGENTRY_BASE_DELAY_MS", &value)?;
    }
    if let Some(value) = lookup("AGENTRY_REQUEST_TIMEOUT_SECS") {
        config.request_timeout_secs = parse_override("AGENTRY_REQUEST_TIMEOUT_SECS", &value)?;
    }
    Ok(())
}

fn parse_override<T: std::str::FromStr>(variable: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidOverride {
            variable: variable.to_string(),
            message: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    use agentry_types::llm::ProviderKind;

    fn lookup_from<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_load_without_file_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
request_timeout_secs = 12

[retry]
max_attempts = 4
base_delay_ms = 200
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.request_timeout_secs, 12);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.base_delay_ms, 200);
    }

    #[test]
    fn test_load_bad_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        write!(file, "retry = \"not a table\"").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = AgentryConfig::default();
        let vars: HashMap<&str, &str> = [
            ("AGENTRY_PROVIDER", "openai"),
            ("AGENTRY_MAX_ATTEMPTS", "5"),
            ("AGENTRY_OPENAI_MODEL", "gpt-4o-mini"),
        ]
        .into();

        apply_overrides(&mut config, lookup_from(&vars)).unwrap();
        assert_eq!(config.llm.provider, Some(ProviderKind::OpenAiCompat));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.llm.openai_model, "gpt-4o-mini");
        // Untouched settings keep their values
        assert_eq!(config.retry.base_delay_ms, 1000);
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let mut config = AgentryConfig::default();
        let vars: HashMap<&str, &str> = [("AGENTRY_MAX_ATTEMPTS", "many")].into();

        let err = apply_overrides(&mut config, lookup_from(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOverride { ref variable, .. }
                if variable == "AGENTRY_MAX_ATTEMPTS"
        ));
    }

    #[test]
    fn test_invalid_provider_override() {
        let mut config = AgentryConfig::default();
        let vars: HashMap<&str, &str> = [("AGENTRY_PROVIDER", "bedrock")].into();
        assert!(apply_overrides(&mut config, lookup_from(&vars)).is_err());
    }
}
