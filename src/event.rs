//! Lifecycle event notifications for the dispatch queue

use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::broadcast;

/// A queue lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEvent {
    /// Event key (e.g., "dispatch.item.accepted")
    pub key: String,

    /// Structured event fields (item name, type, key, reason, ...)
    pub fields: HashMap<String, serde_json::Value>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl DispatchEvent {
    /// Create an event with no fields
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a field (builder pattern)
    pub fn field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Broadcast-backed event emitter
#[derive(Clone)]
pub struct EventEmitter {
    sender: Arc<broadcast::Sender<DispatchEvent>>,
}

impl EventEmitter {
    /// Create a new event emitter with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Emit an event; dropped when no subscriber is listening
    pub fn emit(&self, event: DispatchEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to raw events
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.sender.subscribe()
    }

    /// Subscribe to filtered events as an [`EventStream`]
    pub fn subscribe_filtered(
        &self,
        filter: impl Fn(&DispatchEvent) -> bool + Send + Sync + 'static,
    ) -> EventStream {
        use tokio_stream::wrappers::BroadcastStream;
        use tokio_stream::StreamExt as _;
        let stream = BroadcastStream::new(self.sender.subscribe())
            .filter_map(|r: Result<DispatchEvent, _>| r.ok())
            .filter(move |e| filter(e));
        EventStream {
            inner: Box::pin(stream),
        }
    }

    /// Subscribe to all events as an [`EventStream`]
    pub fn subscribe_stream(&self) -> EventStream {
        self.subscribe_filtered(|_| true)
    }
}

/// Event stream implementing `futures_core::Stream<Item = DispatchEvent>`
pub struct EventStream {
    inner: Pin<Box<dyn Stream<Item = DispatchEvent> + Send>>,
}

impl Stream for EventStream {
    type Item = DispatchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl EventStream {
    /// Receive the next matching event
    pub async fn recv(&mut self) -> Option<DispatchEvent> {
        use tokio_stream::StreamExt;
        self.next().await
    }
}

/// Event catalog - predefined event keys
pub mod events {
    pub const ITEM_ACCEPTED: &str = "dispatch.item.accepted";
    pub const ITEM_REJECTED: &str = "dispatch.item.rejected";
    pub const ITEM_STARTED: &str = "dispatch.item.started";
    pub const ITEM_COMPLETED: &str = "dispatch.item.completed";
    pub const ITEM_FAILED: &str = "dispatch.item.failed";
    pub const CHAIN_CONTINUED: &str = "dispatch.chain.continued";
    pub const SHUTDOWN_STARTED: &str = "dispatch.shutdown.started";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_new() {
        let event = DispatchEvent::new("dispatch.item.accepted");
        assert_eq!(event.key, "dispatch.item.accepted");
        assert!(event.fields.is_empty());
    }

    #[test]
    fn test_event_fields_builder() {
        let event = DispatchEvent::new(events::ITEM_FAILED)
            .field("name", "purge-wf-1")
            .field("attempts", 1);

        assert_eq!(event.fields["name"], serde_json::json!("purge-wf-1"));
        assert_eq!(event.fields["attempts"], serde_json::json!(1));
    }

    #[test]
    fn test_event_timestamp() {
        let before = Utc::now();
        let event = DispatchEvent::new("test.event");
        let after = Utc::now();

        assert!(event.timestamp >= before);
        assert!(event.timestamp <= after);
    }

    #[test]
    fn test_event_serialization() {
        let event = DispatchEvent::new(events::ITEM_COMPLETED).field("id", "abc");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("dispatch.item.completed"));
        assert!(json.contains("timestamp"));

        let parsed: DispatchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.key, events::ITEM_COMPLETED);
    }

    #[tokio::test]
    async fn test_emitter_subscribe() {
        let emitter = EventEmitter::new(16);
        let mut receiver = emitter.subscribe();

        emitter.emit(DispatchEvent::new("test.event"));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.key, "test.event");
    }

    #[tokio::test]
    async fn test_emitter_multiple_subscribers() {
        let emitter = EventEmitter::new(16);
        let mut rx1 = emitter.subscribe();
        let mut rx2 = emitter.subscribe();

        emitter.emit(DispatchEvent::new("broadcast"));

        assert_eq!(rx1.recv().await.unwrap().key, "broadcast");
        assert_eq!(rx2.recv().await.unwrap().key, "broadcast");
    }

    #[tokio::test]
    async fn test_stream_filtered() {
        let emitter = EventEmitter::new(16);
        let mut stream = emitter.subscribe_filtered(|e| e.key == events::ITEM_REJECTED);

        emitter.emit(DispatchEvent::new(events::ITEM_ACCEPTED));
        emitter.emit(DispatchEvent::new(events::ITEM_REJECTED).field("reason", "capacity"));

        let event = stream.recv().await.unwrap();
        assert_eq!(event.key, events::ITEM_REJECTED);
        assert_eq!(event.fields["reason"], serde_json::json!("capacity"));
    }

    #[tokio::test]
    async fn test_stream_implements_stream() {
        use tokio_stream::StreamExt;

        let emitter = EventEmitter::new(16);
        let mut stream = emitter.subscribe_stream();

        emitter.emit(DispatchEvent::new("via.stream"));

        let event = tokio::time::timeout(std::time::Duration::from_millis(200), stream.next())
            .await
            .expect("Timeout waiting for event")
            .expect("Stream ended unexpectedly");
        assert_eq!(event.key, "via.stream");
    }
}
