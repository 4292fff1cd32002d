//! Domain models and value objects

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Keyword lists used by the input filter
///
/// Keywords are stored lower-cased so that matching against lower-cased
/// input is case-insensitive regardless of how the configuration spells them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfiguration {
    topic_keywords: Vec<String>,
    toxic_keywords: Vec<String>,
}

impl FilterConfiguration {
    /// Build a configuration snapshot, normalizing keywords to lower case
    pub fn new(
        topic_keywords: Vec<String>,
        toxic_keywords: Vec<String>,
    ) -> Result<Self, FilterConfigError> {
        Ok(Self {
            topic_keywords: normalize_keywords("topic_keywords", topic_keywords)?,
            toxic_keywords: normalize_keywords("toxic_keywords", toxic_keywords)?,
        })
    }

    pub fn topic_keywords(&self) -> &[String] {
        &self.topic_keywords
    }

    pub fn toxic_keywords(&self) -> &[String] {
        &self.toxic_keywords
    }
}

fn normalize_keywords(
    list: &'static str,
    keywords: Vec<String>,
) -> Result<Vec<String>, FilterConfigError> {
    keywords
        .into_iter()
        .enumerate()
        .map(|(index, keyword)| {
            // A blank keyword is a substring of every input
            if keyword.trim().is_empty() {
                Err(FilterConfigError::BlankKeyword { list, index })
            } else {
                Ok(keyword.to_lowercase())
            }
        })
        .collect()
}

/// Errors raised while building a filter configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterConfigError {
    #[error("Blank keyword at {list}[{index}]")]
    BlankKeyword { list: &'static str, index: usize },
}

/// Outcome of classifying raw user input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyVerdict {
    Safe,
    EmptyInput,
    TooLong,
    RestrictedTopic,
    PotentiallyToxic,
}

impl SafetyVerdict {
    pub fn is_safe(self) -> bool {
        matches!(self, SafetyVerdict::Safe)
    }

    /// Guardrail tag recorded in the interaction log, if this verdict is logged
    pub fn guardrail_type(self) -> Option<GuardrailType> {
        match self {
            SafetyVerdict::TooLong => Some(GuardrailType::InputLength),
            SafetyVerdict::PotentiallyToxic => Some(GuardrailType::ToxicityFilter),
            SafetyVerdict::RestrictedTopic => Some(GuardrailType::TopicRestriction),
            SafetyVerdict::Safe | SafetyVerdict::EmptyInput => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SafetyVerdict::Safe => "safe",
            SafetyVerdict::EmptyInput => "empty_input",
            SafetyVerdict::TooLong => "too_long",
            SafetyVerdict::RestrictedTopic => "restricted_topic",
            SafetyVerdict::PotentiallyToxic => "potentially_toxic",
        }
    }
}

impl std::fmt::Display for SafetyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable tag identifying which input guardrail rejected a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailType {
    InputLength,
    ToxicityFilter,
    TopicRestriction,
}

impl GuardrailType {
    pub fn as_str(self) -> &'static str {
        match self {
            GuardrailType::InputLength => "input_length",
            GuardrailType::ToxicityFilter => "toxicity_filter",
            GuardrailType::TopicRestriction => "topic_restriction",
        }
    }
}

impl std::fmt::Display for GuardrailType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic checks over a generated response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub length_appropriate: bool,
    pub has_citations: bool,
    pub is_helpful: bool,
    pub is_safe: bool,
}

/// One completed exchange, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique record ID
    pub id: Uuid,
    /// Raw user input
    pub user_input: String,
    /// Final text shown to the user, or the rejection note for blocked input
    pub bot_response: String,
    /// When the exchange completed
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Whether an input guardrail rejected this turn
    pub guardrail_triggered: bool,
    /// Which guardrail fired
    pub guardrail_type: Option<GuardrailType>,
}

impl Turn {
    /// A turn answered by the generation gateway
    pub fn answered(user_input: &str, bot_response: String, timestamp: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_input: user_input.to_string(),
            bot_response,
            timestamp,
            guardrail_triggered: false,
            guardrail_type: None,
        }
    }

    /// A turn rejected by an input guardrail
    pub fn rejected(
        user_input: &str,
        note: &str,
        guardrail: GuardrailType,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_input: user_input.to_string(),
            bot_response: note.to_string(),
            timestamp,
            guardrail_triggered: true,
            guardrail_type: Some(guardrail),
        }
    }
}

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A role-tagged message sent to the generation gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Result returned by the generation gateway
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// Generated text, absent when the service produced nothing usable
    pub content: Option<String>,
}

impl Generation {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    pub fn empty() -> Self {
        Self { content: None }
    }

    /// Content with blank text treated as missing
    pub fn usable_content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|content| !content.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_configuration_lowercases_keywords() {
        let config =
            FilterConfiguration::new(vec!["Politics".to_string()], vec!["HATE".to_string()])
                .unwrap();

        assert_eq!(config.topic_keywords(), ["politics"]);
        assert_eq!(config.toxic_keywords(), ["hate"]);
    }

    #[test]
    fn test_filter_configuration_rejects_blank_keyword() {
        let result = FilterConfiguration::new(vec![], vec!["stupid".to_string(), "  ".to_string()]);

        assert_eq!(
            result,
            Err(FilterConfigError::BlankKeyword {
                list: "toxic_keywords",
                index: 1
            })
        );
    }

    #[test]
    fn test_verdict_guardrail_tags() {
        assert_eq!(
            SafetyVerdict::TooLong.guardrail_type().map(GuardrailType::as_str),
            Some("input_length")
        );
        assert_eq!(
            SafetyVerdict::PotentiallyToxic
                .guardrail_type()
                .map(GuardrailType::as_str),
            Some("toxicity_filter")
        );
        assert_eq!(
            SafetyVerdict::RestrictedTopic
                .guardrail_type()
                .map(GuardrailType::as_str),
            Some("topic_restriction")
        );
        assert_eq!(SafetyVerdict::EmptyInput.guardrail_type(), None);
        assert_eq!(SafetyVerdict::Safe.guardrail_type(), None);
    }

    #[test]
    fn test_turn_serializes_guardrail_tag() {
        let turn = Turn::rejected(
            "I hate this",
            "Input rejected - potentially toxic",
            GuardrailType::ToxicityFilter,
            OffsetDateTime::UNIX_EPOCH,
        );

        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["guardrail_triggered"], true);
        assert_eq!(value["guardrail_type"], "toxicity_filter");
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_generation_blank_content_is_unusable() {
        assert_eq!(Generation::text("   ").usable_content(), None);
        assert_eq!(Generation::empty().usable_content(), None);
        assert_eq!(Generation::text("hi").usable_content(), Some("hi"));
    }
}
