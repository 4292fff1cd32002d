//! OpenAI-compatible chat completions adapter (Groq, OpenAI, vLLM, ...)

use async_trait::async_trait;
use guardrail_chat_domain::{ChatMessage, GatewayError, Generation, GenerationGateway};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{GatewayConfig, generation_from_parts, http_client, transport_error, with_instructions, with_retries};

/// Groq's OpenAI-compatible endpoint
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Gateway for any provider speaking the `/chat/completions` protocol
pub struct OpenAiCompatGateway {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: GatewayConfig,
}

impl OpenAiCompatGateway {
    pub fn new(
        api_key: SecretString,
        base_url: String,
        config: GatewayConfig,
    ) -> Result<Self, GatewayError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GatewayError::Config("base_url is required".to_string()));
        }

        Ok(Self {
            client: http_client(&config)?,
            api_key,
            base_url,
            config,
        })
    }

    /// Gateway pointed at Groq
    pub fn groq(api_key: SecretString, config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::new(api_key, GROQ_BASE_URL.to_string(), config)
    }

    async fn call_api(&self, messages: &[ChatMessage]) -> Result<Generation, GatewayError> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| RequestMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_output_tokens),
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == 429 {
            return Err(GatewayError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidFormat(e.to_string()))?;

        Ok(generation_from_parts(
            api_response
                .choices
                .into_iter()
                .filter_map(|c| c.message.content),
        ))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl GenerationGateway for OpenAiCompatGateway {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Generation, GatewayError> {
        let messages = with_instructions(self.config.instructions.as_deref(), messages);
        let messages = messages.as_slice();

        with_retries(self.provider(), self.config.retries, move || {
            self.call_api(messages)
        })
        .await
    }

    fn provider(&self) -> &'static str {
        "openai_compat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(uri: String, retries: u32) -> OpenAiCompatGateway {
        OpenAiCompatGateway::new(
            SecretString::new("test-key".into()),
            uri,
            GatewayConfig {
                retries,
                instructions: Some("Stay on topic.".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn mock_success_response(content: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": content } }
            ]
        })
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    { "role": "system", "content": "Stay on topic." },
                    { "role": "user", "content": "What is AI?" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(mock_success_response("AI is a field of study.".into())),
            )
            .mount(&mock_server)
            .await;

        let result = gateway(mock_server.uri(), 0)
            .generate(&[ChatMessage::user("What is AI?")])
            .await
            .unwrap();

        assert_eq!(result, Generation::text("AI is a field of study."));
    }

    #[tokio::test]
    async fn test_null_content_is_empty_generation() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(mock_success_response(serde_json::Value::Null)),
            )
            .mount(&mock_server)
            .await;

        let result = gateway(mock_server.uri(), 0)
            .generate(&[ChatMessage::user("hi")])
            .await
            .unwrap();

        assert_eq!(result, Generation::empty());
    }

    #[tokio::test]
    async fn test_generate_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = gateway(mock_server.uri(), 2)
            .generate(&[ChatMessage::user("hi")])
            .await;

        assert_eq!(result, Err(GatewayError::RateLimited));
    }

    #[tokio::test]
    async fn test_generate_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
            .mount(&mock_server)
            .await;

        let result = gateway(mock_server.uri(), 0)
            .generate(&[ChatMessage::user("hi")])
            .await;

        assert!(matches!(result, Err(GatewayError::Api(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_format() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let result = gateway(mock_server.uri(), 0)
            .generate(&[ChatMessage::user("hi")])
            .await;

        assert!(matches!(result, Err(GatewayError::InvalidFormat(_))));
    }

    #[test]
    fn test_blank_base_url_rejected() {
        let result = OpenAiCompatGateway::new(
            SecretString::new("key".into()),
            "  ".to_string(),
            GatewayConfig::default(),
        );

        assert!(matches!(result, Err(GatewayError::Config(_))));
    }
}
