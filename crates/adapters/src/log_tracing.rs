//! Interaction log that forwards records as structured tracing events

use async_trait::async_trait;
use guardrail_chat_domain::{InteractionLog, LogError, Turn};
use time::format_description::well_known::Rfc3339;

/// Emits each turn as an `info` event on the `interactions` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInteractionLog;

#[async_trait]
impl InteractionLog for TracingInteractionLog {
    async fn record(&self, turn: &Turn) -> Result<(), LogError> {
        let timestamp = turn
            .timestamp
            .format(&Rfc3339)
            .map_err(|e| LogError::Unavailable(e.to_string()))?;

        tracing::info!(
            target: "interactions",
            turn_id = %turn.id,
            timestamp = %timestamp,
            user_input = %turn.user_input,
            bot_response = %turn.bot_response,
            guardrail_triggered = turn.guardrail_triggered,
            guardrail_type = turn.guardrail_type.map(|g| g.as_str()),
            "Interaction logged"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardrail_chat_domain::GuardrailType;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn test_record_succeeds_without_subscriber() {
        let turn = Turn::rejected(
            "I hate this",
            "Input rejected - potentially toxic",
            GuardrailType::ToxicityFilter,
            OffsetDateTime::UNIX_EPOCH,
        );

        assert!(TracingInteractionLog.record(&turn).await.is_ok());
    }
}
