//! Broadcast hub built on `tokio::sync::broadcast`

use tokio::sync::broadcast;

use crate::ports::outbound::{BroadcastChannel, PortError};

/// Messages a slow subscriber may fall behind by before it starts lagging
pub const DEFAULT_HUB_CAPACITY: usize = 64;

/// One publish on the hub
#[derive(Debug, Clone, PartialEq)]
pub struct HubMessage {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Fan-out point shared by every client in the process
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    sender: broadcast::Sender<HubMessage>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HUB_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every message published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<HubMessage> {
        self.sender.subscribe()
    }

    /// Publishing handle for one client
    pub fn channel(&self) -> HubChannel {
        HubChannel {
            sender: self.sender.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

/// [`BroadcastChannel`] that publishes onto a [`BroadcastHub`]
#[derive(Debug, Clone)]
pub struct HubChannel {
    sender: broadcast::Sender<HubMessage>,
}

impl BroadcastChannel for HubChannel {
    fn send(&self, topic: &str, payload: serde_json::Value) -> Result<(), PortError> {
        let message = HubMessage {
            topic: topic.to_string(),
            payload,
        };
        match self.sender.send(message) {
            Ok(receivers) => {
                tracing::trace!(topic, receivers, "Published to hub");
                Ok(())
            }
            Err(_) => Err(PortError::broadcast(topic, "no subscribers")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_every_subscriber_receives_publish() {
        let hub = BroadcastHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.channel().send("topic", json!({ "n": 1 })).unwrap();

        let expected = HubMessage {
            topic: "topic".into(),
            payload: json!({ "n": 1 }),
        };
        assert_eq!(first.recv().await.unwrap(), expected);
        assert_eq!(second.recv().await.unwrap(), expected);
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[test]
    fn test_send_without_subscribers_fails() {
        let hub = BroadcastHub::new();
        let err = hub.channel().send("topic", json!(null)).unwrap_err();
        assert!(matches!(err, PortError::Broadcast { .. }));
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let hub = BroadcastHub::with_capacity(1);
        let mut receiver = hub.subscribe();
        let channel = hub.channel();
        channel.send("topic", json!(1)).unwrap();
        channel.send("topic", json!(2)).unwrap();

        assert!(matches!(
            receiver.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(receiver.recv().await.unwrap().payload, json!(2));
    }
}
