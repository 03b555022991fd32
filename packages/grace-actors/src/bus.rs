//! Topic-oriented event bus for publishing domain events.
//!
//! # Guarantees
//!
//! - **Fire-and-forget**: publishing never awaits acknowledgement.
//! - **Best-effort ordered per publisher**: a single broadcast channel
//!   preserves send order; slow receivers may lag and drop.
//! - **Advisory stream**: events are published *after* state persistence,
//!   so a crash between persist and publish loses the publish. Consumers
//!   (read-model updaters, external subscribers) must treat the stream as
//!   derived, not authoritative.

use serde_json::Value;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 10_000;

/// A message published on a topic.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub body: Value,
}

/// Broadcast-backed pub/sub bus.
#[derive(Clone)]
pub struct MessageBus {
    sender: broadcast::Sender<PublishedMessage>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a message; returns the number of live subscribers.
    ///
    /// Zero subscribers is not an error - the stream is advisory.
    pub fn publish(&self, topic: &str, body: Value) -> usize {
        self.sender
            .send(PublishedMessage {
                topic: topic.to_string(),
                body,
            })
            .unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedMessage> {
        self.sender.subscribe()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn subscribers_receive_in_publish_order() {
        let bus = MessageBus::new();
        let mut receiver = bus.subscribe();

        bus.publish("graceevents", json!({"n": 1}));
        bus.publish("graceevents", json!({"n": 2}));

        assert_eq!(receiver.recv().await.unwrap().body, json!({"n": 1}));
        assert_eq!(receiver.recv().await.unwrap().body, json!({"n": 2}));
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let bus = MessageBus::new();
        assert_eq!(bus.publish("graceevents", json!({})), 0);
    }
}
