//! JSON-lines interaction log written to a local file

use async_trait::async_trait;
use guardrail_chat_domain::{InteractionLog, LogError, Turn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one JSON object per turn to a file
#[derive(Debug, Clone)]
pub struct JsonlInteractionLog {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl JsonlInteractionLog {
    pub async fn new(path: PathBuf) -> Result<Self, LogError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl InteractionLog for JsonlInteractionLog {
    async fn record(&self, turn: &Turn) -> Result<(), LogError> {
        let mut line = serde_json::to_string(turn)?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(turn_id = %turn.id, path = %self.path.display(), "Interaction logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardrail_chat_domain::GuardrailType;
    use serde_json::Value;
    use tempfile::TempDir;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn test_writes_one_json_line_per_turn() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("logs").join("interactions.jsonl");

        let log = JsonlInteractionLog::new(path.clone()).await.expect("log");

        let answered = Turn::answered(
            "What is AI?",
            "A field of study.".to_string(),
            OffsetDateTime::UNIX_EPOCH,
        );
        let rejected = Turn::rejected(
            &"a".repeat(1001),
            "Input rejected - too long",
            GuardrailType::InputLength,
            OffsetDateTime::UNIX_EPOCH,
        );

        log.record(&answered).await.expect("record answered");
        log.record(&rejected).await.expect("record rejected");

        let contents = tokio::fs::read_to_string(&path).await.expect("read log");
        let lines: Vec<Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json"))
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["user_input"], "What is AI?");
        assert_eq!(lines[0]["guardrail_triggered"], false);
        assert_eq!(lines[0]["guardrail_type"], Value::Null);
        assert_eq!(lines[1]["guardrail_triggered"], true);
        assert_eq!(lines[1]["guardrail_type"], "input_length");
        assert_eq!(lines[1]["bot_response"], "Input rejected - too long");
    }

    #[tokio::test]
    async fn test_appends_to_existing_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("interactions.jsonl");
        tokio::fs::write(&path, "{\"existing\":true}\n")
            .await
            .expect("seed file");

        let log = JsonlInteractionLog::new(path.clone()).await.expect("log");
        log.record(&Turn::answered("hi", "hello there!".to_string(), OffsetDateTime::UNIX_EPOCH))
            .await
            .expect("record");

        let contents = tokio::fs::read_to_string(&path).await.expect("read log");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.starts_with("{\"existing\":true}"));
    }
}
