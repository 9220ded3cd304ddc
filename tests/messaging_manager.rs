//! MessagingManager fan-in and routing with an in-process adapter.

use futures::StreamExt as _;
use groupmate::messaging::traits::{InboundStream, Messaging};
use groupmate::messaging::MessagingManager;
use groupmate::{InboundMessage, OutboundResponse, StatusUpdate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Adapter that emits a fixed set of messages and records what it is asked to send.
struct RecordingAdapter {
    name: &'static str,
    inbound: Mutex<Vec<InboundMessage>>,
    sent: Arc<Mutex<Vec<(String, OutboundResponse)>>>,
    statuses: Arc<Mutex<Vec<StatusUpdate>>>,
    healthy: bool,
}

impl RecordingAdapter {
    fn new(name: &'static str, inbound: Vec<InboundMessage>) -> Self {
        Self {
            name,
            inbound: Mutex::new(inbound),
            sent: Arc::new(Mutex::new(Vec::new())),
            statuses: Arc::new(Mutex::new(Vec::new())),
            healthy: true,
        }
    }
}

impl Messaging for RecordingAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn start(&self) -> groupmate::Result<InboundStream> {
        let messages = std::mem::take(&mut *self.inbound.lock().unwrap());
        Ok(Box::pin(futures::stream::iter(messages)))
    }

    async fn respond(
        &self,
        message: &InboundMessage,
        response: OutboundResponse,
    ) -> groupmate::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((message.conversation_id.clone(), response));
        Ok(())
    }

    async fn send_status(
        &self,
        _message: &InboundMessage,
        status: StatusUpdate,
    ) -> groupmate::Result<()> {
        self.statuses.lock().unwrap().push(status);
        Ok(())
    }

    async fn health_check(&self) -> groupmate::Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(anyhow::anyhow!("offline").into())
        }
    }
}

fn inbound(source: &str, conversation_id: &str, content: &str) -> InboundMessage {
    InboundMessage {
        id: format!("{conversation_id}-{content}"),
        source: source.into(),
        conversation_id: conversation_id.into(),
        sender_id: "user-1".into(),
        content: content.into(),
        timestamp: chrono::Utc::now(),
        metadata: HashMap::new(),
    }
}

#[tokio::test]
async fn adapter_streams_are_merged() {
    let manager = MessagingManager::new();
    manager
        .register(RecordingAdapter::new(
            "alpha",
            vec![inbound("alpha", "alpha:1", "!ask a")],
        ))
        .await;
    manager
        .register(RecordingAdapter::new(
            "beta",
            vec![
                inbound("beta", "beta:1", "!ask b"),
                inbound("beta", "beta:1", "!hei"),
            ],
        ))
        .await;

    let stream = manager.start().await.unwrap();
    let mut contents: Vec<String> = stream.take(3).map(|m| m.content).collect().await;
    contents.sort();

    assert_eq!(contents, vec!["!ask a", "!ask b", "!hei"]);
}

#[tokio::test]
async fn responses_route_to_the_source_adapter() {
    let alpha = RecordingAdapter::new("alpha", Vec::new());
    let beta = RecordingAdapter::new("beta", Vec::new());
    let alpha_sent = alpha.sent.clone();
    let beta_sent = beta.sent.clone();
    let beta_statuses = beta.statuses.clone();

    let manager = MessagingManager::new();
    manager.register(alpha).await;
    manager.register(beta).await;

    let message = inbound("beta", "beta:7", "!ask hi");
    manager
        .send_status(&message, StatusUpdate::Thinking)
        .await
        .unwrap();
    manager
        .respond(&message, OutboundResponse::Text("hello".into()))
        .await
        .unwrap();

    assert!(alpha_sent.lock().unwrap().is_empty());
    let sent = beta_sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "beta:7");
    assert!(matches!(&sent[0].1, OutboundResponse::Text(text) if text == "hello"));
    assert_eq!(*beta_statuses.lock().unwrap(), vec![StatusUpdate::Thinking]);
}

#[tokio::test]
async fn unknown_source_is_an_error() {
    let manager = MessagingManager::new();
    manager.register(RecordingAdapter::new("alpha", Vec::new())).await;

    let result = manager
        .respond(
            &inbound("gamma", "gamma:1", "x"),
            OutboundResponse::Text("y".into()),
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn start_can_only_be_called_once() {
    let manager = MessagingManager::new();
    manager.register(RecordingAdapter::new("alpha", Vec::new())).await;

    assert!(manager.start().await.is_ok());
    assert!(manager.start().await.is_err());
}

#[tokio::test]
async fn health_check_reports_failing_adapters() {
    let mut offline = RecordingAdapter::new("offline", Vec::new());
    offline.healthy = false;

    let manager = MessagingManager::new();
    manager.register(RecordingAdapter::new("online", Vec::new())).await;
    manager.register(offline).await;

    assert_eq!(manager.health_check().await, vec!["offline".to_string()]);
}
