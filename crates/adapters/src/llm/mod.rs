//! Generation gateway adapters

pub mod anthropic;
pub mod ollama;
pub mod openai_compat;
pub mod stub;

pub use anthropic::AnthropicGateway;
pub use ollama::OllamaGateway;
pub use openai_compat::OpenAiCompatGateway;
pub use stub::StubGateway;

use guardrail_chat_domain::{ChatMessage, GatewayError, Generation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Common gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Model name/ID
    pub model: String,
    /// Temperature (0.0-1.0)
    pub temperature: f64,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries on failure
    pub retries: u32,
    /// Rail instructions sent as the system message
    pub instructions: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.2,
            max_output_tokens: 600,
            timeout_secs: 45,
            retries: 2,
            instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
        }
    }
}

/// System prompt used when the config does not provide one
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful, factual assistant. \
Decline requests about politics or illegal activities, never produce hateful or \
harmful content, keep answers concise, and cite sources for external facts.";

/// Build an HTTP client honoring the configured request timeout
pub(crate) fn http_client(config: &GatewayConfig) -> Result<Client, GatewayError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport error, keeping timeouts distinguishable
pub(crate) fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Api(error.to_string())
    }
}

/// Conversation with the rail instructions prepended as a system message
pub(crate) fn with_instructions(
    instructions: Option<&str>,
    messages: &[ChatMessage],
) -> Vec<ChatMessage> {
    instructions
        .filter(|text| !text.trim().is_empty())
        .map(ChatMessage::system)
        .into_iter()
        .chain(messages.iter().cloned())
        .collect()
}

/// Wrap joined text, treating an empty join as no content
pub(crate) fn generation_from_parts(parts: impl IntoIterator<Item = String>) -> Generation {
    let text = parts.into_iter().collect::<Vec<_>>().join("");
    if text.is_empty() {
        Generation::empty()
    } else {
        Generation::text(text)
    }
}

/// Upper bound on the wait between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential backoff starting at 1s, capped at `MAX_BACKOFF`
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let millis = 2_u64.saturating_pow(attempt).saturating_mul(500);
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

/// Run `call` up to `retries + 1` times with exponential backoff.
///
/// Rate limiting is returned immediately; it is never retried.
pub(crate) async fn with_retries<F, Fut>(
    provider: &'static str,
    retries: u32,
    mut call: F,
) -> Result<Generation, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Generation, GatewayError>>,
{
    let mut last_error = None;
    for attempt in 0..=retries {
        if attempt > 0 {
            tracing::warn!(provider, attempt, "Retrying generation");
            tokio::time::sleep(backoff_delay(attempt)).await;
        }

        match call().await {
            Ok(generation) => return Ok(generation),
            Err(GatewayError::RateLimited) => return Err(GatewayError::RateLimited),
            Err(e) => {
                tracing::warn!(provider, error = %e, "Generation attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| GatewayError::Api("Unknown error".to_string())))
}
