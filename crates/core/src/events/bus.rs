use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::{sync::mpsc, time::Instant};
use uuid::Uuid;

use crate::events::{EnrichedEvent, SessionEvent};

pub type EventInbox = mpsc::UnboundedReceiver<Arc<EnrichedEvent>>;

/// Serializes every input of one session into a single ordered queue.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

struct EventBusInner {
    session_id: Uuid,
    next_ingest_seq: AtomicU64,
    dropped_total: AtomicU64,
    tx: mpsc::UnboundedSender<Arc<EnrichedEvent>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("session_id", &self.inner.session_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl EventBus {
    pub fn new(session_id: Uuid) -> (Self, EventInbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bus = Self {
            inner: Arc::new(EventBusInner {
                session_id,
                next_ingest_seq: AtomicU64::new(0),
                dropped_total: AtomicU64::new(0),
                tx,
            }),
        };
        (bus, rx)
    }

    /// Returns `false` when the session is gone and the event was dropped.
    pub fn publish(&self, event: SessionEvent) -> bool {
        let ingest_seq = self.inner.next_ingest_seq.fetch_add(1, Ordering::Relaxed);

        let enriched = Arc::new(EnrichedEvent {
            event,
            session_id: self.inner.session_id,
            ingest_seq,
            ingested_at: Instant::now(),
        });

        if self.inner.tx.send(enriched).is_err() {
            self.inner.dropped_total.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn dropped_total(&self) -> u64 {
        self.inner.dropped_total.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{events::UserAction, player::PlayerEvent};

    #[tokio::test]
    async fn events_are_numbered_in_publish_order() {
        let (bus, mut inbox) = EventBus::new(Uuid::new_v4());
        bus.publish(SessionEvent::Player(PlayerEvent::Play));
        bus.publish(SessionEvent::User(UserAction::WatchAgain));

        let first = inbox.recv().await.unwrap();
        let second = inbox.recv().await.unwrap();
        assert_eq!(first.ingest_seq, 0);
        assert_eq!(second.ingest_seq, 1);
        assert_eq!(second.event.event_type(), "user");
        assert_eq!(first.session_id, bus.session_id());
    }

    #[tokio::test]
    async fn publish_after_close_is_counted_as_dropped() {
        let (bus, inbox) = EventBus::new(Uuid::new_v4());
        drop(inbox);
        assert!(!bus.publish(SessionEvent::Player(PlayerEvent::Pause)));
        assert_eq!(bus.dropped_total(), 1);
        assert!(bus.is_closed());
    }
}
