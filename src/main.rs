//! Groupmate CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use futures::StreamExt as _;
use groupmate::commands::ParseOutcome;
use groupmate::conversation::ConversationStore;
use groupmate::messaging::MessagingManager;
use groupmate::messaging::discord::DiscordAdapter;
use groupmate::{Bot, InboundMessage, OutboundResponse, StatusUpdate};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "groupmate")]
#[command(about = "Discord group member that answers through a chat-completion model")]
struct Cli {
    /// Path to config file (optional)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("starting groupmate");

    match groupmate::config::load_dotenv(std::path::Path::new(".env")) {
        Ok(true) => tracing::info!("loaded environment from .env"),
        Ok(false) => {}
        Err(error) => tracing::warn!(%error, "ignoring unreadable .env file"),
    }

    let config = if let Some(config_path) = cli.config {
        groupmate::config::Config::load_from_path(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        groupmate::config::Config::load().with_context(|| "failed to load configuration")?
    };

    tracing::info!(instance_dir = %config.instance_dir.display(), "configuration loaded");

    let client = groupmate::llm::select_client(&config.llm)
        .with_context(|| "failed to initialize completion client")?;

    let store = Arc::new(RwLock::new(ConversationStore::new()));
    let bot = Bot::new(store, client, config.discord.prefix.clone());

    let messaging_manager = Arc::new(MessagingManager::new());
    messaging_manager
        .register(DiscordAdapter::new(
            &config.discord.token,
            config.discord.allow_bot_messages,
        ))
        .await;

    let mut inbound = messaging_manager
        .start()
        .await
        .with_context(|| "failed to start messaging adapters")?;

    let failing = messaging_manager.health_check().await;
    if !failing.is_empty() {
        tracing::warn!(adapters = ?failing, "messaging adapters failed their startup health check");
    }

    loop {
        tokio::select! {
            message = inbound.next() => {
                let Some(message) = message else {
                    tracing::warn!("inbound stream closed");
                    break;
                };
                let bot = bot.clone();
                let messaging_manager = messaging_manager.clone();
                tokio::spawn(async move {
                    handle_message(&bot, &messaging_manager, message).await;
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    messaging_manager.shutdown().await;

    tracing::info!("groupmate stopped");
    Ok(())
}

/// Run one inbound message through the bot and deliver the reply.
async fn handle_message(bot: &Bot, messaging_manager: &MessagingManager, message: InboundMessage) {
    let outcome = bot.parse(&message.content);
    if outcome == ParseOutcome::Ignored {
        return;
    }

    let calls_model = matches!(
        &outcome,
        ParseOutcome::Command(command) if command.instruction().is_some()
    );
    if calls_model {
        if let Err(error) = messaging_manager
            .send_status(&message, StatusUpdate::Thinking)
            .await
        {
            tracing::debug!(%error, "failed to start typing indicator");
        }
    }

    let Some(reply) = bot.run(&message.conversation_id, outcome).await else {
        return;
    };

    if let Err(error) = messaging_manager
        .respond(&message, OutboundResponse::Text(reply))
        .await
    {
        tracing::error!(
            %error,
            channel_id = %message.conversation_id,
            "failed to deliver reply"
        );
    }
}
