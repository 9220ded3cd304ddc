//! Per-channel conversation memory and prompt assembly.

pub mod prompt;
pub mod store;

pub use prompt::{PromptMessage, PromptRole, SYSTEM_PROMPT, assemble};
pub use store::{ChannelHistory, ConversationStore, Exchange, HISTORY_CAPACITY, Role};
