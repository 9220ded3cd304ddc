//! Prompt assembly: system instruction, remembered history, then the new message.

use crate::conversation::store::{ChannelHistory, Role};

use serde::{Deserialize, Serialize};

/// Fixed system instruction sent at the top of every prompt.
pub const SYSTEM_PROMPT: &str = "Du er gruppens KI-medlem. Vær presis, hjelpsom og kortfattet. \
    Hjelp med: intervjuguider, dokumentanalyse, organisasjonsanalyse, \
    SPGR-refleksjon (ikke finn på resultater), og forslag til tiltak.";

/// Role on the completion wire. Unlike [`Role`], this includes `system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl From<Role> for PromptRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => PromptRole::User,
            Role::Assistant => PromptRole::Assistant,
        }
    }
}

/// A single message submitted to the completion API. Built per call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: PromptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Build the ordered message list for one completion call.
///
/// Output is always `[system, ..history (oldest first), user]`. The history is
/// only read.
pub fn assemble(
    history: &ChannelHistory,
    system_instruction: &str,
    new_user_text: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::new(PromptRole::System, system_instruction));
    messages.extend(
        history
            .iter()
            .map(|exchange| PromptMessage::new(exchange.role().into(), exchange.text())),
    );
    messages.push(PromptMessage::new(PromptRole::User, new_user_text));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::store::{ConversationStore, Exchange};

    #[test]
    fn empty_history_yields_system_then_user() {
        let history = ChannelHistory::new(30);
        let messages = assemble(&history, "be brief", "hello");

        assert_eq!(
            messages,
            vec![
                PromptMessage::new(PromptRole::System, "be brief"),
                PromptMessage::new(PromptRole::User, "hello"),
            ]
        );
    }

    #[test]
    fn history_is_placed_between_system_and_new_message_in_order() {
        let mut history = ChannelHistory::new(30);
        history.push(Exchange::new(Role::User, "first"));
        history.push(Exchange::new(Role::Assistant, "reply one"));
        history.push(Exchange::new(Role::User, "second"));
        history.push(Exchange::new(Role::Assistant, "reply two"));

        let messages = assemble(&history, SYSTEM_PROMPT, "third");

        let roles: Vec<PromptRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                PromptRole::System,
                PromptRole::User,
                PromptRole::Assistant,
                PromptRole::User,
                PromptRole::Assistant,
                PromptRole::User,
            ]
        );
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![SYSTEM_PROMPT, "first", "reply one", "second", "reply two", "third"]
        );
    }

    #[test]
    fn assembly_is_pure() {
        let mut store = ConversationStore::new();
        store.append("c", Role::User, "hi");
        store.append("c", Role::Assistant, "hello");
        let history = store.snapshot("c");
        let before = history.clone();

        let first = assemble(&history, SYSTEM_PROMPT, "again");
        let second = assemble(&history, SYSTEM_PROMPT, "again");

        assert_eq!(first, second);
        assert_eq!(history, before);
    }

    #[test]
    fn serializes_with_wire_role_names() {
        let message = PromptMessage::new(PromptRole::System, "x");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "x"}));
    }
}
