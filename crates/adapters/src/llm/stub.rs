//! Stub gateway for testing and offline mode

use async_trait::async_trait;
use guardrail_chat_domain::{ChatMessage, GatewayError, Generation, GenerationGateway, Role};

enum StubMode {
    Reply(Generation),
    Fail(GatewayError),
    Echo,
}

/// Stub gateway that returns configurable responses
pub struct StubGateway {
    mode: StubMode,
}

impl StubGateway {
    /// Create a stub that always returns the given text
    pub fn with_reply(text: impl Into<String>) -> Self {
        Self {
            mode: StubMode::Reply(Generation::text(text)),
        }
    }

    /// Create a stub that returns no content
    pub fn empty() -> Self {
        Self {
            mode: StubMode::Reply(Generation::empty()),
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: GatewayError) -> Self {
        Self {
            mode: StubMode::Fail(error),
        }
    }

    /// Create a stub that echoes the last user message back
    pub fn echo() -> Self {
        Self {
            mode: StubMode::Echo,
        }
    }
}

impl Default for StubGateway {
    fn default() -> Self {
        Self::echo()
    }
}

#[async_trait]
impl GenerationGateway for StubGateway {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Generation, GatewayError> {
        match &self.mode {
            StubMode::Reply(generation) => Ok(generation.clone()),
            StubMode::Fail(error) => Err(error.clone()),
            StubMode::Echo => {
                let last_user = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                Ok(Generation::text(format!(
                    "Stub reply to: {} (Source: stub gateway)",
                    last_user
                )))
            }
        }
    }

    fn provider(&self) -> &'static str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_reply() {
        let gateway = StubGateway::with_reply("Fixed answer");
        let result = gateway.generate(&[ChatMessage::user("q")]).await.unwrap();

        assert_eq!(result, Generation::text("Fixed answer"));
    }

    #[tokio::test]
    async fn test_error_stub() {
        let gateway = StubGateway::with_error(GatewayError::Timeout);
        let result = gateway.generate(&[ChatMessage::user("q")]).await;

        assert_eq!(result, Err(GatewayError::Timeout));
    }

    #[tokio::test]
    async fn test_echo_uses_last_user_message() {
        let gateway = StubGateway::echo();
        let result = gateway
            .generate(&[
                ChatMessage::system("rules"),
                ChatMessage::user("What is AI?"),
            ])
            .await
            .unwrap();

        assert_eq!(
            result.content.as_deref(),
            Some("Stub reply to: What is AI? (Source: stub gateway)")
        );
    }

    #[tokio::test]
    async fn test_empty_stub() {
        let result = StubGateway::empty()
            .generate(&[ChatMessage::user("q")])
            .await
            .unwrap();

        assert_eq!(result.content, None);
    }
}
