//! In-process fan-out of comment events.
//!
//! Every subscriber owns a bounded queue of `capacity` events. `publish`
//! waits for room in each queue, so a slow consumer holds the publisher back
//! instead of missing events. Receivers that were dropped are pruned on the
//! next publish. Nothing is persisted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use commentary_core::domain::events::{CommentEvent, EventPublisher};

pub const DEFAULT_CAPACITY: usize = 1024;

type Subscribers = Vec<mpsc::Sender<CommentEvent>>;

#[derive(Clone)]
pub struct EventBus {
    capacity: usize,
    subscribers: Arc<Mutex<Subscribers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            subscribers: Arc::default(),
        }
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> mpsc::Receiver<CommentEvent> {
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.lock().push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().iter().filter(|sender| !sender.is_closed()).count()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: CommentEvent) {
        let name = event.name.as_str();
        let subscribers = self.lock().clone();
        if subscribers.is_empty() {
            debug!(event = name, "event dropped: no subscribers");
            return;
        }
        let mut receivers = 0;
        for sender in &subscribers {
            if sender.send(event.clone()).await.is_ok() {
                receivers += 1;
            }
        }
        if receivers < subscribers.len() {
            self.lock().retain(|sender| !sender.is_closed());
        }
        debug!(event = name, receivers, "event published");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use commentary_core::domain::comments::{Comment, CommentStatus};
    use commentary_core::domain::events::EventName;
    use commentary_core::domain::settings::PluginSettings;
    use commentary_core::service::{CommentService, RepublishFilter};
    use commentary_core::store::CommentStore;
    use commentary_core::testing::MemoryStore;

    use super::*;

    fn comment(n: u128) -> Comment {
        let created_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(n as i64);
        Comment {
            id: Uuid::from_u128(n),
            content: format!("comment {n}"),
            author_id: "u1".to_string(),
            organization_id: None,
            entity_context_id: "post-1".to_string(),
            status: CommentStatus::Published,
            parent_comment_id: None,
            section_id: None,
            is_reported: false,
            version: 1,
            meta: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn event(name: EventName) -> CommentEvent {
        CommentEvent::comment(name, comment(1), &PluginSettings::default())
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::with_capacity(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(event(EventName::CommentCreate)).await;

        assert_eq!(first.recv().await.unwrap().name, EventName::CommentCreate);
        assert_eq!(second.recv().await.unwrap().name, EventName::CommentCreate);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        bus.publish(event(EventName::CommentDelete)).await;
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn dropped_receivers_are_pruned() {
        let bus = EventBus::with_capacity(1);
        let mut kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(event(EventName::CommentCreate)).await;

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.lock().len(), 1);
        assert_eq!(kept.recv().await.unwrap().name, EventName::CommentCreate);
    }

    #[tokio::test]
    async fn full_queue_holds_the_publisher_until_drained() {
        let bus = EventBus::with_capacity(2);
        let mut receiver = bus.subscribe();
        let consumer = tokio::spawn(async move {
            let mut names = Vec::new();
            while let Some(event) = receiver.recv().await {
                names.push(event.name);
            }
            names
        });

        for _ in 0..10 {
            bus.publish(event(EventName::CommentUpdate)).await;
        }
        bus.publish(event(EventName::CommentDelete)).await;
        drop(bus);

        let names = consumer.await.unwrap();
        assert_eq!(names.len(), 11);
        assert_eq!(names.last(), Some(&EventName::CommentDelete));
    }

    #[tokio::test]
    async fn republish_sweep_larger_than_capacity_reaches_consumer() {
        let store = Arc::new(MemoryStore::new());
        for n in 0..1500 {
            store.insert_comment(&comment(n)).await.unwrap();
        }
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        let consumer = tokio::spawn(async move {
            let mut received = 0usize;
            while let Some(event) = receiver.recv().await {
                assert_eq!(event.name, EventName::CommentRepublish);
                received += 1;
            }
            received
        });
        let service = CommentService::new(store, Arc::new(bus.clone()), PluginSettings::default());

        let filter = RepublishFilter::new(None, Some("post-1".to_string())).unwrap();
        let count = service.admin_republish_comments(filter).await.unwrap();
        drop(service);
        drop(bus);

        assert_eq!(count, 1500);
        assert_eq!(consumer.await.unwrap(), 1500);
    }
}
