//! OpenAI-compatible completion client.
//!
//! Speaks the `/chat/completions` wire shape, so it works against
//! OpenAI itself and against any local server that mimics it. Only
//! plain text completions are used; tool calling, vision and
//! streaming stay out of scope.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{CompletionClient, LlmError};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Endpoint settings for [`HttpCompletion`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpLlmConfig {
    /// Full chat-completions URL.
    pub api_url: String,
    /// Bearer token; omitted entirely when empty (local servers).
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl Default for HttpLlmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            timeout_ms: 60_000,
        }
    }
}

impl HttpLlmConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// HTTP-backed [`CompletionClient`].
pub struct HttpCompletion {
    config: HttpLlmConfig,
    client: reqwest::Client,
}

impl HttpCompletion {
    pub fn new(config: HttpLlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletion {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let request = ApiRequest {
            model: self.config.model.clone(),
            messages: vec![
                ApiMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ApiMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: Some(max_tokens),
            temperature: Some(self.config.temperature),
        };

        let mut builder = self.client.post(&self.config.api_url).json(&request);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Service(format!("HTTP {status}: {body}")));
        }

        let payload: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let reply = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if reply.trim().is_empty() {
            return Err(LlmError::EmptyReply);
        }
        debug!(model = %self.config.model, chars = reply.len(), "completion received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_shape_is_chat_completions() {
        let request = ApiRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![
                ApiMessage {
                    role: "system".to_string(),
                    content: "be terse".to_string(),
                },
                ApiMessage {
                    role: "user".to_string(),
                    content: "hello".to_string(),
                },
            ],
            max_tokens: Some(256),
            temperature: Some(0.2),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
        assert_eq!(value["max_tokens"], 256);
    }

    #[test]
    fn response_parses_first_choice_content() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"action\":\"wait\"}"}}
            ]
        }"#;
        let payload: ApiResponse = serde_json::from_str(raw).unwrap();
        let content = payload.choices[0].message.content.as_deref();
        assert_eq!(content, Some("{\"action\":\"wait\"}"));
    }

    #[test]
    fn empty_choices_parse_without_error() {
        let payload: ApiResponse = serde_json::from_str("{}").unwrap();
        assert!(payload.choices.is_empty());
    }
}
