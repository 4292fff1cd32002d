//! In-memory interaction log for testing and offline mode

use async_trait::async_trait;
use guardrail_chat_domain::{InteractionLog, LogError, Turn};
use std::sync::RwLock;

/// In-memory interaction log implementation
pub struct InMemoryInteractionLog {
    turns: RwLock<Vec<Turn>>,
}

impl InMemoryInteractionLog {
    pub fn new() -> Self {
        Self {
            turns: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of every recorded turn, oldest first
    pub fn turns(&self) -> Result<Vec<Turn>, LogError> {
        let turns = self
            .turns
            .read()
            .map_err(|e| LogError::Unavailable(e.to_string()))?;
        Ok(turns.clone())
    }
}

impl Default for InMemoryInteractionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InteractionLog for InMemoryInteractionLog {
    async fn record(&self, turn: &Turn) -> Result<(), LogError> {
        let mut turns = self
            .turns
            .write()
            .map_err(|e| LogError::Unavailable(e.to_string()))?;
        turns.push(turn.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn test_records_in_order() {
        let log = InMemoryInteractionLog::new();

        let first = Turn::answered("one", "first reply".to_string(), OffsetDateTime::UNIX_EPOCH);
        let second = Turn::answered("two", "second reply".to_string(), OffsetDateTime::UNIX_EPOCH);

        log.record(&first).await.unwrap();
        log.record(&second).await.unwrap();

        assert_eq!(log.turns().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_starts_empty() {
        assert!(InMemoryInteractionLog::default().turns().unwrap().is_empty());
    }
}
