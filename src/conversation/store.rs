//! Bounded in-memory conversation history, keyed by channel.

use crate::ChannelId;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Maximum number of entries remembered per channel.
///
/// Counted in single entries, not turns. Every exchange appends a user entry
/// and an assistant entry, so a channel remembers at most 15 turns.
pub const HISTORY_CAPACITY: usize = 30;

/// Speaker of a remembered entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One remembered entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    role: Role,
    text: String,
}

impl Exchange {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Chronological, capacity-bounded history of one channel.
///
/// Appending past capacity evicts the oldest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHistory {
    entries: VecDeque<Exchange>,
    capacity: usize,
}

impl ChannelHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, exchange: Exchange) {
        self.entries.push_back(exchange);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ChannelHistory {
    type Item = &'a Exchange;
    type IntoIter = std::collections::vec_deque::Iter<'a, Exchange>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Process-wide owner of every channel's history.
///
/// Plain data, no locking. Callers that share it across tasks wrap it in a
/// lock covering the whole store.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    channels: HashMap<ChannelId, ChannelHistory>,
    capacity: usize,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: HashMap::new(),
            capacity,
        }
    }

    /// History for a channel, created empty on first access.
    pub fn get(&mut self, channel_id: &str) -> &ChannelHistory {
        self.entry(channel_id)
    }

    /// Owned copy of a channel's history. Does not create an entry.
    pub fn snapshot(&self, channel_id: &str) -> ChannelHistory {
        self.channels
            .get(channel_id)
            .cloned()
            .unwrap_or_else(|| ChannelHistory::new(self.capacity))
    }

    pub fn append(&mut self, channel_id: &str, role: Role, text: impl Into<String>) {
        self.entry(channel_id).push(Exchange::new(role, text));
    }

    /// Empty a channel's history in place. The channel entry itself is kept.
    pub fn reset(&mut self, channel_id: &str) {
        self.entry(channel_id).clear();
    }

    /// Number of channels seen so far.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn entry(&mut self, channel_id: &str) -> &mut ChannelHistory {
        let capacity = self.capacity;
        self.channels
            .entry(ChannelId::from(channel_id))
            .or_insert_with(|| ChannelHistory::new(capacity))
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
