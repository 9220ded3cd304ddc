//! MessagingManager: fan-in of adapter streams and response routing.

use crate::messaging::traits::{InboundStream, Messaging, MessagingDyn};
use crate::{InboundMessage, OutboundResponse, StatusUpdate};

use anyhow::Context as _;
use futures::StreamExt as _;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Owns every registered adapter.
///
/// Each adapter's stream is forwarded into one shared channel, so the main
/// loop consumes a single inbound stream regardless of how many platforms
/// are connected.
pub struct MessagingManager {
    adapters: RwLock<HashMap<String, Arc<dyn MessagingDyn>>>,
    fan_in_tx: mpsc::Sender<InboundMessage>,
    /// Receiver side, taken once by `start()`.
    fan_in_rx: RwLock<Option<mpsc::Receiver<InboundMessage>>>,
}

impl MessagingManager {
    pub fn new() -> Self {
        let (fan_in_tx, fan_in_rx) = mpsc::channel(512);
        Self {
            adapters: RwLock::new(HashMap::new()),
            fan_in_tx,
            fan_in_rx: RwLock::new(Some(fan_in_rx)),
        }
    }

    /// Register an adapter before `start()`.
    pub async fn register(&self, adapter: impl Messaging) {
        let name = adapter.name().to_string();
        tracing::info!(adapter = %name, "registered messaging adapter");
        self.adapters.write().await.insert(name, Arc::new(adapter));
    }

    /// Start all registered adapters and return the merged inbound stream.
    ///
    /// An adapter that fails to start is logged and skipped.
    pub async fn start(&self) -> crate::Result<InboundStream> {
        let adapters = self.adapters.read().await;
        for (name, adapter) in adapters.iter() {
            match adapter.start().await {
                Ok(stream) => Self::spawn_forwarder(name.clone(), stream, self.fan_in_tx.clone()),
                Err(error) => {
                    tracing::error!(adapter = %name, %error, "adapter failed to start, skipping")
                }
            }
        }
        drop(adapters);

        let receiver = self
            .fan_in_rx
            .write()
            .await
            .take()
            .context("start() already called")?;

        Ok(Box::pin(tokio_stream::wrappers::ReceiverStream::new(
            receiver,
        )))
    }

    fn spawn_forwarder(
        name: String,
        mut stream: InboundStream,
        fan_in_tx: mpsc::Sender<InboundMessage>,
    ) {
        tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                if fan_in_tx.send(message).await.is_err() {
                    tracing::warn!(adapter = %name, "fan-in channel closed, stopping forwarder");
                    break;
                }
            }
            tracing::info!(adapter = %name, "adapter stream ended");
        });
    }

    /// Route a response back to the adapter the message came from.
    pub async fn respond(
        &self,
        message: &InboundMessage,
        response: OutboundResponse,
    ) -> crate::Result<()> {
        let adapter = self.adapter_for(&message.source).await?;
        adapter.respond(message, response).await
    }

    /// Route a status update to the adapter the message came from.
    pub async fn send_status(
        &self,
        message: &InboundMessage,
        status: StatusUpdate,
    ) -> crate::Result<()> {
        let adapter = self.adapter_for(&message.source).await?;
        adapter.send_status(message, status).await
    }

    /// Health-check every adapter. Returns the names of failing adapters.
    pub async fn health_check(&self) -> Vec<String> {
        let adapters = self.adapters.read().await;
        let mut failing = Vec::new();
        for (name, adapter) in adapters.iter() {
            if let Err(error) = adapter.health_check().await {
                tracing::warn!(adapter = %name, %error, "adapter health check failed");
                failing.push(name.clone());
            }
        }
        failing
    }

    /// Shut down all adapters gracefully.
    pub async fn shutdown(&self) {
        let adapters = self.adapters.read().await;
        for (name, adapter) in adapters.iter() {
            if let Err(error) = adapter.shutdown().await {
                tracing::warn!(adapter = %name, %error, "failed to shut down adapter");
            }
        }
    }

    async fn adapter_for(&self, source: &str) -> crate::Result<Arc<dyn MessagingDyn>> {
        let adapters = self.adapters.read().await;
        let adapter = adapters
            .get(source)
            .cloned()
            .with_context(|| format!("no messaging adapter named '{source}'"))?;
        Ok(adapter)
    }
}

impl Default for MessagingManager {
    fn default() -> Self {
        Self::new()
    }
}
