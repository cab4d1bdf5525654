use crate::llm::{LanguageModel, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "claude";

#[derive(Debug, Clone)]
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
pub struct ClaudeRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClaudeMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaudeResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<ResponseContent>,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl ClaudeResponse {
    /// First text block of the reply.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ResponseContent::Text { text } => Some(text.as_str()),
            ResponseContent::Unsupported => None,
        })
    }
}

impl ClaudeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.anthropic.com/v1".to_string(),
            model: "claude-sonnet-4-5".to_string(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    fn build_request(&self, prompt: &str, temperature: f32) -> ClaudeRequest {
        ClaudeRequest {
            model: self.model.clone(),
            max_tokens: 1024,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(temperature),
        }
    }

    pub async fn generate_content(&self, prompt: &str, temperature: f32) -> Result<ClaudeResponse, LlmError> {
        let request = self.build_request(prompt, temperature);

        tracing::debug!("Claude API request: model {}, {} prompt chars", request.model, prompt.len());

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .timeout(Duration::from_secs(120))
            .json(&request)
            .send()
            .await
            .map_err(|source| LlmError::Transport { provider: PROVIDER, source })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|source| LlmError::Transport { provider: PROVIDER, source })?;

        if !status.is_success() {
            tracing::error!("Claude API error ({}): {}", status, response_text);
            return Err(LlmError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body: response_text,
            });
        }

        let parsed: ClaudeResponse = serde_json::from_str(&response_text)
            .map_err(|source| LlmError::Parse { provider: PROVIDER, source })?;

        tracing::debug!(
            "Claude API response {}: {} in / {} out tokens, stop reason {:?}",
            parsed.id,
            parsed.usage.input_tokens,
            parsed.usage.output_tokens,
            parsed.stop_reason
        );
        Ok(parsed)
    }
}

#[async_trait]
impl LanguageModel for ClaudeClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let response = self.generate_content(prompt, temperature).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse(PROVIDER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_prompt_and_temperature() {
        let client = ClaudeClient::new("key".to_string()).with_model("claude-test".to_string());
        let request = client.build_request("list employees", 0.1);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-test");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "list employees");
        assert!(json["temperature"].as_f64().unwrap() > 0.09);
    }

    #[test]
    fn test_first_text_skips_non_text_blocks() {
        let body = r#"{
            "id": "msg_1",
            "model": "claude-sonnet-4-5",
            "role": "assistant",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "```sql\nSELECT 1\n```"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let parsed: ClaudeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.first_text(), Some("```sql\nSELECT 1\n```"));
    }
}
