//! Anthropic Messages API adapter

use async_trait::async_trait;
use guardrail_chat_domain::{ChatMessage, GatewayError, Generation, GenerationGateway, Role};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{GatewayConfig, generation_from_parts, http_client, transport_error, with_retries};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic gateway
pub struct AnthropicGateway {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: GatewayConfig,
}

impl AnthropicGateway {
    pub fn new(api_key: SecretString, config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_base_url(api_key, ANTHROPIC_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(
        api_key: SecretString,
        base_url: String,
        config: GatewayConfig,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: http_client(&config)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    async fn call_api(&self, messages: &[ChatMessage]) -> Result<Generation, GatewayError> {
        // System text travels in its own field, not in the message list
        let mut system: Vec<&str> = self
            .config
            .instructions
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .into_iter()
            .collect();
        system.extend(
            messages
                .iter()
                .filter(|m| m.role == Role::System)
                .map(|m| m.content.as_str()),
        );

        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_output_tokens,
            messages: messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| Message {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n\n"))
            },
            temperature: Some(self.config.temperature),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
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

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidFormat(e.to_string()))?;

        Ok(generation_from_parts(
            api_response
                .content
                .into_iter()
                .filter(|c| c.r#type == "text")
                .map(|c| c.text),
        ))
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    r#type: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl GenerationGateway for AnthropicGateway {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Generation, GatewayError> {
        with_retries(self.provider(), self.config.retries, move || {
            self.call_api(messages)
        })
        .await
    }

    fn provider(&self) -> &'static str {
        "anthropic"
    }
}
