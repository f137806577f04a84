//! Broadcast event bus for distributing `ItemEvent` to multiple subscribers.
//!
//! Built on `tokio::sync::broadcast`. Dashboards, notification senders, and
//! audit sinks each take their own receiver; publishing with no active
//! subscribers is a no-op.

use atelier_types::event::ItemEvent;
use tokio::sync::broadcast;

/// Multi-consumer event bus for item transition events.
///
/// Wraps a `tokio::sync::broadcast` channel. Cloning the bus clones the
/// sender, allowing multiple producers and consumers.
pub struct EventBus {
    sender: broadcast::Sender<ItemEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no subscribers, the event is silently dropped.
    pub fn publish(&self, event: ItemEvent) {
        let _ = self.sender.send(event);
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let id = Uuid::now_v7();
        bus.publish(ItemEvent::PipelineCompleted { item_id: id });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.item_id(), id);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let bus = EventBus::new(16);
        bus.publish(ItemEvent::PipelineCompleted {
            item_id: Uuid::now_v7(),
        });
        // No panic, nothing to assert -- the event is dropped.
    }

    #[tokio::test]
    async fn cloned_bus_shares_the_channel() {
        let bus = EventBus::new(16);
        let clone = bus.clone();
        let mut rx = bus.subscribe();

        let id = Uuid::now_v7();
        clone.publish(ItemEvent::ItemCancelled {
            item_id: id,
            reason: "test".to_string(),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.item_id(), id);
    }
}
