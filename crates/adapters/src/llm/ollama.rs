//! Ollama local LLM adapter

use async_trait::async_trait;
use guardrail_chat_domain::{ChatMessage, GatewayError, Generation, GenerationGateway};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GatewayConfig, http_client, transport_error, with_instructions, with_retries};

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Ollama gateway for local models
pub struct OllamaGateway {
    client: Client,
    base_url: String,
    config: GatewayConfig,
}

impl OllamaGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_base_url(OLLAMA_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(base_url: String, config: GatewayConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: http_client(&config)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    async fn call_api(&self, messages: &[ChatMessage]) -> Result<Generation, GatewayError> {
        let request = OllamaRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: Some(self.config.temperature),
                num_predict: Some(self.config.max_output_tokens as i32),
            }),
        };

        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidFormat(e.to_string()))?;

        Ok(Generation {
            content: api_response
                .message
                .map(|m| m.content)
                .filter(|content| !content.is_empty()),
        })
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: Option<OllamaReply>,
}

#[derive(Deserialize)]
struct OllamaReply {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl GenerationGateway for OllamaGateway {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Generation, GatewayError> {
        let messages = with_instructions(self.config.instructions.as_deref(), messages);
        let messages = messages.as_slice();

        with_retries(self.provider(), self.config.retries, move || {
            self.call_api(messages)
        })
        .await
    }

    fn provider(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(uri: String) -> OllamaGateway {
        OllamaGateway::with_base_url(
            uri,
            GatewayConfig {
                model: "llama3".to_string(),
                retries: 0,
                instructions: None,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3",
                "stream": false,
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": { "role": "assistant", "content": "Hi! How can I help?" },
                "done": true
            })))
            .mount(&mock_server)
            .await;

        let result = gateway(mock_server.uri())
            .generate(&[ChatMessage::user("hello")])
            .await
            .unwrap();

        assert_eq!(result, Generation::text("Hi! How can I help?"));
    }

    #[tokio::test]
    async fn test_missing_message_is_empty_generation() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "done": true
            })))
            .mount(&mock_server)
            .await;

        let result = gateway(mock_server.uri())
            .generate(&[ChatMessage::user("hello")])
            .await
            .unwrap();

        assert_eq!(result, Generation::empty());
    }

    #[tokio::test]
    async fn test_model_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&mock_server)
            .await;

        let result = gateway(mock_server.uri())
            .generate(&[ChatMessage::user("hello")])
            .await;

        assert!(matches!(result, Err(GatewayError::Api(_))));
    }
}
