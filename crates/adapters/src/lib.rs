//! guardrail-chat adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `llm`: generation gateways (OpenAI-compatible/Groq, Anthropic, Ollama, stub)
//! - `interaction_log`: JSONL file, tracing and in-memory interaction logs

mod log_jsonl;
mod log_memory;
mod log_tracing;

pub mod llm;

/// Re-exports for interaction log adapters
pub mod interaction_log {
    pub use crate::log_jsonl::JsonlInteractionLog;
    pub use crate::log_memory::InMemoryInteractionLog;
    pub use crate::log_tracing::TracingInteractionLog;
}
