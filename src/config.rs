// src/config.rs
//! Runtime configuration, read from the environment (and `.env` via dotenvy in main).

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Cohere,
    Claude,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Cohere => "cohere",
            LlmProvider::Claude => "claude",
        }
    }

    /// Environment variable holding the API key for this provider.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::Cohere => "COHERE_API_KEY",
            LlmProvider::Claude => "ANTHROPIC_API_KEY",
        }
    }
}

#[derive(Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: f32,
}

// Hand-written so the API key never ends up in logs.
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub llm: LlmConfig,
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub history_window: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr: SocketAddr = parse_or("BIND_ADDR", get("BIND_ADDR"), "0.0.0.0:5000".parse().ok())?;

        let provider = match get("LLM_PROVIDER").map(|p| p.to_ascii_lowercase()) {
            None => LlmProvider::Cohere,
            Some(p) if p == "cohere" => LlmProvider::Cohere,
            Some(p) if p == "claude" || p == "anthropic" => LlmProvider::Claude,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LLM_PROVIDER",
                    value: other,
                })
            }
        };

        let temperature: f32 = parse_or("LLM_TEMPERATURE", get("LLM_TEMPERATURE"), Some(0.1))?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                key: "LLM_TEMPERATURE",
                value: temperature.to_string(),
            });
        }

        let session_ttl_secs: u64 = parse_or("SESSION_TTL_SECS", get("SESSION_TTL_SECS"), Some(3600))?;
        let sweep_secs: u64 = parse_or("SESSION_SWEEP_SECS", get("SESSION_SWEEP_SECS"), Some(300))?;
        let history_window: usize = parse_or("HISTORY_WINDOW", get("HISTORY_WINDOW"), Some(4))?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_SWEEP_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            llm: LlmConfig {
                provider,
                api_key: get(provider.api_key_var()),
                model: get("LLM_MODEL"),
                temperature,
            },
            session_ttl: Duration::from_secs(session_ttl_secs),
            session_sweep_interval: Duration::from_secs(sweep_secs),
            history_window,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: Option<T>,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => default.ok_or(ConfigError::Invalid {
            key,
            value: String::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.llm.provider, LlmProvider::Cohere);
        assert!(config.llm.api_key.is_none());
        assert!((config.llm.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.history_window, 4);
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_claude_provider_reads_anthropic_key() {
        let config = config_from(&[
            ("LLM_PROVIDER", "Claude"),
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("COHERE_API_KEY", "co-test"),
        ])
        .unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Claude);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = config_from(&[("COHERE_API_KEY", "   ")]).unwrap();
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("LLM_PROVIDER", "openai")]).is_err());
        assert!(config_from(&[("SESSION_TTL_SECS", "soon")]).is_err());
        assert!(config_from(&[("LLM_TEMPERATURE", "7")]).is_err());
        assert!(config_from(&[("BIND_ADDR", "localhost")]).is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = config_from(&[("COHERE_API_KEY", "secret-key")]).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
