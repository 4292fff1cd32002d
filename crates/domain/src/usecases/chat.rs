//! Chat use case - runs one conversation turn through the guardrail pipeline

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::{
    model::{ChatMessage, FilterConfiguration, SafetyVerdict, Turn},
    policy::check_response_quality,
    ports::{Clock, GatewayError, GenerationGateway, InteractionLog},
    usecases::{
        classify::classify,
        render::{RenderConfig, Renderer},
    },
};

pub const EMPTY_INPUT_REPLY: &str =
    "I didn't receive any message. Could you please ask me something?";
pub const TOO_LONG_REPLY: &str = "Your message is quite long. Could you please break it down into smaller, more specific questions?";
pub const TOXIC_REPLY: &str = "I don't engage with harmful or offensive content. Let's keep our conversation respectful and constructive.";
pub const RESTRICTED_TOPIC_REPLY: &str =
    "I'm sorry, I can't discuss that topic. Please ask about something else.";
pub const NO_CONTENT_REPLY: &str = "I'm sorry, I couldn't generate a response.";
pub const GENERIC_APOLOGY: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again.";

/// Fixed reply shown to the user for a rejected input
pub fn refusal_message(verdict: SafetyVerdict) -> Option<&'static str> {
    match verdict {
        SafetyVerdict::Safe => None,
        SafetyVerdict::EmptyInput => Some(EMPTY_INPUT_REPLY),
        SafetyVerdict::TooLong => Some(TOO_LONG_REPLY),
        SafetyVerdict::RestrictedTopic => Some(RESTRICTED_TOPIC_REPLY),
        SafetyVerdict::PotentiallyToxic => Some(TOXIC_REPLY),
    }
}

/// Note stored as the bot response of a rejected turn in the interaction log
fn rejection_note(verdict: SafetyVerdict) -> &'static str {
    match verdict {
        SafetyVerdict::TooLong => "Input rejected - too long",
        SafetyVerdict::PotentiallyToxic => "Input rejected - potentially toxic",
        SafetyVerdict::RestrictedTopic => "Input rejected - restricted topic",
        SafetyVerdict::Safe | SafetyVerdict::EmptyInput => "Input rejected",
    }
}

/// Configuration for the chat pipeline
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    /// Keyword snapshot used by the input filter
    pub filters: FilterConfiguration,
    /// Post-processing config
    pub render_config: RenderConfig,
    /// Upper bound on a single gateway call (None = wait indefinitely)
    pub gateway_timeout: Option<Duration>,
    /// Maximum turns kept in history (None = unbounded)
    pub history_limit: Option<usize>,
}

/// Errors caught at the pipeline boundary and turned into apologies
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Generation failed: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Turn processing panicked: {0}")]
    Panicked(String),
}

/// Conversation pipeline: filter, generate, check, render, record.
///
/// One pipeline owns one conversation history. Turns are processed one at a
/// time because `process_turn` takes `&mut self`.
pub struct ChatPipeline<G, L, Cl>
where
    G: GenerationGateway + ?Sized,
    L: InteractionLog + ?Sized,
    Cl: Clock + ?Sized,
{
    gateway: Arc<G>,
    interaction_log: Arc<L>,
    clock: Arc<Cl>,
    config: ChatConfig,
    renderer: Renderer,
    history: VecDeque<Turn>,
}

impl<G, L, Cl> ChatPipeline<G, L, Cl>
where
    G: GenerationGateway + ?Sized,
    L: InteractionLog + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(gateway: Arc<G>, interaction_log: Arc<L>, clock: Arc<Cl>, config: ChatConfig) -> Self {
        let renderer = Renderer::new(config.render_config.clone());
        Self {
            gateway,
            interaction_log,
            clock,
            config,
            renderer,
            history: VecDeque::new(),
        }
    }

    /// Process one user message and return the text to show.
    ///
    /// Never fails: gateway errors, timeouts and panics become the generic apology.
    pub async fn process_turn(&mut self, user_input: &str) -> String {
        let outcome = AssertUnwindSafe(self.try_process_turn(user_input))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ChatError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    provider = self.gateway.provider(),
                    error = %e,
                    "Error in chat processing"
                );
                GENERIC_APOLOGY.to_string()
            }
        }
    }

    async fn try_process_turn(&mut self, user_input: &str) -> Result<String, ChatError> {
        let verdict = classify(user_input, &self.config.filters);

        if let Some(refusal) = refusal_message(verdict) {
            self.reject(user_input, verdict).await;
            return Ok(refusal.to_string());
        }

        let messages = [ChatMessage::user(user_input)];
        let call = self.gateway.generate(&messages);
        let generation = match self.config.gateway_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ChatError::Timeout(limit))??,
            None => call.await?,
        };

        let response = generation.usable_content().unwrap_or_else(|| {
            tracing::warn!(
                provider = self.gateway.provider(),
                "Gateway returned no content, using fallback"
            );
            NO_CONTENT_REPLY
        });

        let report = check_response_quality(response);
        tracing::debug!(?report, "Checked response quality");
        let bot_response = self.renderer.render(response, &report);

        let turn = Turn::answered(user_input, bot_response.clone(), self.clock.now());
        self.push_history(turn.clone());
        self.record(&turn).await;

        Ok(bot_response)
    }

    /// Record a rejected input; empty input is never recorded
    async fn reject(&self, user_input: &str, verdict: SafetyVerdict) {
        let Some(guardrail) = verdict.guardrail_type() else {
            tracing::debug!(verdict = %verdict, "Input rejected without logging");
            return;
        };

        tracing::info!(verdict = %verdict, guardrail = %guardrail, "Input rejected");

        let turn = Turn::rejected(
            user_input,
            rejection_note(verdict),
            guardrail,
            self.clock.now(),
        );
        self.record(&turn).await;
    }

    async fn record(&self, turn: &Turn) {
        if let Err(e) = self.interaction_log.record(turn).await {
            tracing::warn!(turn_id = %turn.id, error = %e, "Failed to record interaction");
        }
    }

    fn push_history(&mut self, turn: Turn) {
        if let Some(limit) = self.config.history_limit {
            if limit == 0 {
                return;
            }
            while self.history.len() >= limit {
                self.history.pop_front();
            }
        }
        self.history.push_back(turn);
    }

    /// All turns in this session, oldest first
    pub fn history(&self) -> &VecDeque<Turn> {
        &self.history
    }

    /// The last `n` turns, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Turn> {
        self.history.iter().skip(self.history.len().saturating_sub(n))
    }

    /// Forget the session history. The interaction log is untouched.
    pub fn clear(&mut self) {
        self.history.clear();
        tracing::info!("Conversation history cleared");
    }

    pub fn filters(&self) -> &FilterConfiguration {
        &self.config.filters
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
