//! Application use cases / business logic

pub mod chat;
pub mod classify;
pub mod render;

pub use chat::{ChatConfig, ChatError, ChatPipeline};
pub use classify::{classify, matched_keyword};
pub use render::{RenderConfig, Renderer};
