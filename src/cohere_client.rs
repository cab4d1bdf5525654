// src/cohere_client.rs
use crate::llm::{LanguageModel, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "cohere";

#[derive(Debug, Clone)]
pub struct CohereClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CohereChatRequest<'a> {
    pub message: &'a str,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct CohereChatResponse {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub generation_id: Option<String>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl CohereClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.cohere.com/v1".to_string(),
            // The API picks its default chat model when none is sent
            model: None,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub async fn chat(&self, message: &str, temperature: f32) -> Result<CohereChatResponse, LlmError> {
        let request = CohereChatRequest {
            message,
            temperature,
            model: self.model.as_deref(),
        };

        tracing::debug!("Cohere chat request: {} prompt chars, temperature {}", message.len(), temperature);

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .timeout(Duration::from_secs(120))
            .json(&request)
            .send()
            .await
            .map_err(|source| LlmError::Transport { provider: PROVIDER, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| LlmError::Transport { provider: PROVIDER, source })?;

        if !status.is_success() {
            tracing::error!("Cohere API error ({}): {}", status, body);
            return Err(LlmError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        parse_chat_response(&body)
    }
}

fn parse_chat_response(body: &str) -> Result<CohereChatResponse, LlmError> {
    let parsed: CohereChatResponse =
        serde_json::from_str(body).map_err(|source| LlmError::Parse { provider: PROVIDER, source })?;
    tracing::debug!(
        "Cohere response: generation {:?}, finish reason {:?}",
        parsed.generation_id,
        parsed.finish_reason
    );
    Ok(parsed)
}

#[async_trait]
impl LanguageModel for CohereClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let response = self.chat(prompt, temperature).await?;
        if response.text.trim().is_empty() {
            return Err(LlmError::EmptyResponse(PROVIDER));
        }
        Ok(response.text)
    }
}
