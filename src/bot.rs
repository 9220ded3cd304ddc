//! Command dispatch: prompt assembly, completion, memory update, reply text.

use crate::commands::{self, Command, ParseOutcome};
use crate::conversation::{self, ConversationStore, Role, SYSTEM_PROMPT};
use crate::error::LlmError;
use crate::llm::CompletionClient;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Discord's per-message character limit.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Shared handle to the process-wide conversation store.
pub type SharedStore = Arc<RwLock<ConversationStore>>;

/// Runs commands against the conversation store and the completion client.
///
/// Completion-backed commands remember the full reply text and deliver a copy
/// truncated to [`MAX_MESSAGE_CHARS`]. A failed completion is reported to the
/// channel and not remembered.
#[derive(Clone)]
pub struct Bot {
    store: SharedStore,
    client: Arc<dyn CompletionClient>,
    prefix: String,
}

impl Bot {
    pub fn new(
        store: SharedStore,
        client: Arc<dyn CompletionClient>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            client,
            prefix: prefix.into(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn parse(&self, content: &str) -> ParseOutcome {
        Command::parse(content, &self.prefix)
    }

    /// Execute a parsed message for a channel and return the text to send.
    ///
    /// Returns `None` when the message is not addressed to the bot.
    pub async fn run(&self, channel_id: &str, outcome: ParseOutcome) -> Option<String> {
        let reply = match outcome {
            ParseOutcome::Ignored => return None,
            ParseOutcome::MissingArgument { name } => {
                tracing::debug!(%channel_id, command = name, "command missing argument");
                commands::usage(name, &self.prefix)
            }
            ParseOutcome::Command(command) => self.execute(channel_id, &command).await,
        };

        Some(truncate_chars(&reply, MAX_MESSAGE_CHARS))
    }

    /// Parse and execute in one step.
    pub async fn handle(&self, channel_id: &str, content: &str) -> Option<String> {
        let outcome = self.parse(content);
        self.run(channel_id, outcome).await
    }

    async fn execute(&self, channel_id: &str, command: &Command) -> String {
        // Only `reset`, `hei` and `hjelp` have no instruction.
        let Some(instruction) = command.instruction() else {
            return match command {
                Command::Reset => {
                    self.store.write().await.reset(channel_id);
                    tracing::info!(%channel_id, "channel memory reset");
                    commands::RESET_ACK.to_string()
                }
                Command::Greet => commands::greeting(&self.prefix),
                _ => commands::help_text(&self.prefix),
            };
        };

        match self.converse(channel_id, &instruction).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(
                    %channel_id,
                    command = command.name(),
                    client = self.client.name(),
                    %error,
                    "completion failed"
                );
                format!("Feil mot KI: {error}")
            }
        }
    }

    /// One remembered exchange: assemble, complete, then append user and
    /// assistant entries. Nothing is appended when the completion fails.
    async fn converse(&self, channel_id: &str, instruction: &str) -> Result<String, LlmError> {
        let messages = {
            let store = self.store.read().await;
            conversation::assemble(&store.snapshot(channel_id), SYSTEM_PROMPT, instruction)
        };

        tracing::debug!(
            %channel_id,
            message_count = messages.len(),
            client = self.client.name(),
            "requesting completion"
        );

        let reply = self.client.complete(&messages).await?;

        let mut store = self.store.write().await;
        store.append(channel_id, Role::User, instruction);
        store.append(channel_id, Role::Assistant, reply.as_str());

        Ok(reply)
    }
}

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
