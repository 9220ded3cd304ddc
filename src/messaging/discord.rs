//! Discord messaging adapter using serenity.

use crate::messaging::traits::{InboundStream, Messaging};
use crate::{InboundMessage, OutboundResponse, StatusUpdate};

use anyhow::Context as _;
use async_trait::async_trait;
use serenity::all::{
    ChannelId, Context, EventHandler, GatewayIntents, Http, Message, Ready, ShardManager, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Discord adapter state.
pub struct DiscordAdapter {
    token: String,
    allow_bot_messages: bool,
    http: Arc<RwLock<Option<Arc<Http>>>>,
    bot_user_id: Arc<RwLock<Option<UserId>>>,
    /// Typing handles per message. Typing stops when the handle is dropped.
    typing_tasks: Arc<RwLock<HashMap<String, serenity::http::Typing>>>,
    shard_manager: Arc<RwLock<Option<Arc<ShardManager>>>>,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>, allow_bot_messages: bool) -> Self {
        Self {
            token: token.into(),
            allow_bot_messages,
            http: Arc::new(RwLock::new(None)),
            bot_user_id: Arc::new(RwLock::new(None)),
            typing_tasks: Arc::new(RwLock::new(HashMap::new())),
            shard_manager: Arc::new(RwLock::new(None)),
        }
    }

    async fn get_http(&self) -> anyhow::Result<Arc<Http>> {
        self.http
            .read()
            .await
            .clone()
            .context("discord not connected")
    }

    fn extract_channel_id(&self, message: &InboundMessage) -> anyhow::Result<ChannelId> {
        let id = message
            .metadata
            .get("discord_channel_id")
            .and_then(|v| v.as_u64())
            .context("missing discord_channel_id in metadata")?;
        Ok(ChannelId::new(id))
    }

    async fn stop_typing(&self, message_id: &str) {
        self.typing_tasks.write().await.remove(message_id);
    }
}

impl Messaging for DiscordAdapter {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> crate::Result<InboundStream> {
        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        let handler = Handler {
            inbound_tx,
            allow_bot_messages: self.allow_bot_messages,
            http_slot: self.http.clone(),
            bot_user_id_slot: self.bot_user_id.clone(),
        };

        let intents = GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILDS;

        let mut client = serenity::Client::builder(&self.token, intents)
            .event_handler(handler)
            .await
            .context("failed to build discord client")?;

        *self.http.write().await = Some(client.http.clone());
        *self.shard_manager.write().await = Some(client.shard_manager.clone());

        tokio::spawn(async move {
            if let Err(error) = client.start().await {
                tracing::error!(%error, "discord gateway error");
            }
        });

        let stream = tokio_stream::wrappers::ReceiverStream::new(inbound_rx);
        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        message: &InboundMessage,
        response: OutboundResponse,
    ) -> crate::Result<()> {
        let OutboundResponse::Text(text) = response;

        // The reply replaces the typing indicator started for this message.
        self.stop_typing(&message.id).await;

        let http = self.get_http().await?;
        let channel_id = self.extract_channel_id(message)?;
        channel_id
            .say(&*http, &text)
            .await
            .context("failed to send discord message")?;

        Ok(())
    }

    async fn send_status(
        &self,
        message: &InboundMessage,
        status: StatusUpdate,
    ) -> crate::Result<()> {
        match status {
            StatusUpdate::Thinking => {
                let http = self.get_http().await?;
                let channel_id = self.extract_channel_id(message)?;

                let typing = channel_id.start_typing(&http);
                self.typing_tasks
                    .write()
                    .await
                    .insert(message.id.clone(), typing);
            }
        }

        Ok(())
    }

    async fn health_check(&self) -> crate::Result<()> {
        let http = self.get_http().await?;
        http.get_current_user()
            .await
            .context("discord health check failed")?;
        Ok(())
    }

    async fn shutdown(&self) -> crate::Result<()> {
        self.typing_tasks.write().await.clear();

        if let Some(shard_manager) = self.shard_manager.read().await.as_ref() {
            shard_manager.shutdown_all().await;
        }

        tracing::info!("discord adapter shut down");
        Ok(())
    }
}

// -- Serenity EventHandler --

struct Handler {
    inbound_tx: mpsc::Sender<InboundMessage>,
    allow_bot_messages: bool,
    http_slot: Arc<RwLock<Option<Arc<Http>>>>,
    bot_user_id_slot: Arc<RwLock<Option<UserId>>>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(
            bot_name = %ready.user.name,
            guild_count = ready.guilds.len(),
            "discord connected, ready for group work"
        );

        *self.http_slot.write().await = Some(ctx.http.clone());
        *self.bot_user_id_slot.write().await = Some(ready.user.id);
    }

    async fn message(&self, _ctx: Context, message: Message) {
        // Always ignore our own messages to prevent self-response loops
        let bot_user_id = self.bot_user_id_slot.read().await;
        if bot_user_id.is_some_and(|id| message.author.id == id) {
            return;
        }
        drop(bot_user_id);

        if message.author.bot && !self.allow_bot_messages {
            return;
        }

        let inbound = InboundMessage {
            id: message.id.to_string(),
            source: "discord".into(),
            conversation_id: build_conversation_id(&message),
            sender_id: message.author.id.to_string(),
            content: message.content.clone(),
            timestamp: *message.timestamp,
            metadata: build_metadata(&message),
        };

        if let Err(error) = self.inbound_tx.send(inbound).await {
            tracing::warn!(
                %error,
                "failed to send inbound message from Discord (receiver dropped)"
            );
        }
    }
}

// -- Helper functions --

/// Memory is kept per Discord channel; DMs have their own channel id.
fn build_conversation_id(message: &Message) -> String {
    format!("discord:{}", message.channel_id)
}

/// Replies are routed back through `discord_channel_id`.
fn build_metadata(message: &Message) -> HashMap<String, serde_json::Value> {
    HashMap::from([(
        "discord_channel_id".to_string(),
        message.channel_id.get().into(),
    )])
}
