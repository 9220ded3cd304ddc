//! Groupmate: a Discord group member backed by a chat-completion model.
//!
//! Commands arrive through a messaging adapter, are turned into prompts
//! together with the channel's remembered history, and the model's answer is
//! both remembered and sent back to the channel.

pub mod bot;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod messaging;

pub use bot::Bot;
pub use error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Channel identifier type. Opaque, platform-prefixed (e.g. `discord:123`).
pub type ChannelId = Arc<str>;

/// Inbound message from any messaging platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub source: String,
    /// Key for this conversation's memory.
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Outbound response to messaging platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundResponse {
    Text(String),
}

/// Status updates for messaging platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusUpdate {
    /// Show a typing indicator while the model is working.
    Thinking,
}
