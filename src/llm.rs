// src/llm.rs
//! The language-model seam: one prompt in, raw completion text out.

use crate::claude_client::ClaudeClient;
use crate::cohere_client::CohereClient;
use crate::config::{LlmConfig, LlmProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("failed to parse {provider} response: {source}")]
    Parse {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} response contained no text")]
    EmptyResponse(&'static str),
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError>;
}

/// Builds the configured client. `None` means the service is unavailable and
/// every chat turn must fail with a configuration error.
pub fn build_language_model(config: &LlmConfig) -> Option<Arc<dyn LanguageModel>> {
    let api_key = match config.api_key.clone() {
        Some(key) => key,
        None => {
            tracing::warn!(
                "{} not found. Chat requests will fail until a language model is configured.",
                config.provider.api_key_var()
            );
            return None;
        }
    };

    let client: Arc<dyn LanguageModel> = match config.provider {
        LlmProvider::Cohere => {
            let mut client = CohereClient::new(api_key);
            if let Some(model) = &config.model {
                client = client.with_model(model.clone());
            }
            Arc::new(client)
        }
        LlmProvider::Claude => {
            let mut client = ClaudeClient::new(api_key);
            if let Some(model) = &config.model {
                client = client.with_model(model.clone());
            }
            Arc::new(client)
        }
    };

    tracing::info!("✅ Language model client ready: {}", client.name());
    Some(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: LlmProvider, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider,
            api_key: api_key.map(str::to_string),
            model: None,
            temperature: 0.1,
        }
    }

    #[test]
    fn test_missing_key_leaves_service_unavailable() {
        assert!(build_language_model(&config(LlmProvider::Cohere, None)).is_none());
    }

    #[test]
    fn test_provider_selection() {
        let cohere = build_language_model(&config(LlmProvider::Cohere, Some("k"))).unwrap();
        assert_eq!(cohere.name(), "cohere");

        let claude = build_language_model(&config(LlmProvider::Claude, Some("k"))).unwrap();
        assert_eq!(claude.name(), "claude");
    }
}
