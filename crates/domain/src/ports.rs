//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{ChatMessage, Generation, Turn};

/// Error type for generation gateway operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for the external guardrailed-generation service
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Generate a reply for the given conversation
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Generation, GatewayError>;

    /// Short provider name used in logs
    fn provider(&self) -> &'static str;
}

/// Error type for interaction log sinks
#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Port for the durable, append-only interaction log
#[async_trait]
pub trait InteractionLog: Send + Sync {
    /// Append one turn
    async fn record(&self, turn: &Turn) -> Result<(), LogError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
