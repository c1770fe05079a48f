use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

/// Single-slot queue: a newer value overwrites an unread one.
#[derive(Debug)]
pub struct Latest1Queue<T> {
    slot: Mutex<Option<T>>,
    notify_any: Arc<Notify>,
}

impl<T> Latest1Queue<T> {
    pub fn new(notify_any: Arc<Notify>) -> Self {
        Self {
            slot: Mutex::new(None),
            notify_any,
        }
    }

    pub fn set(&self, value: T) {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(value);
        self.notify_any.notify_one();
    }

    pub fn try_recv(&self) -> Option<T> {
        self.slot.lock().unwrap_or_else(|p| p.into_inner()).take()
    }

    /// Wait until a value is available and take it.
    pub async fn recv(&self) -> T {
        loop {
            if let Some(value) = self.try_recv() {
                return value;
            }
            self.notify_any.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_value_overwrites_unread_one() {
        let q = Latest1Queue::new(Arc::new(Notify::new()));
        q.set(1);
        q.set(2);
        assert_eq!(q.try_recv(), Some(2));
        assert_eq!(q.try_recv(), None);
    }

    #[tokio::test]
    async fn recv_waits_for_a_value() {
        let q = Arc::new(Latest1Queue::new(Arc::new(Notify::new())));
        let writer = Arc::clone(&q);
        tokio::spawn(async move { writer.set("snapshot") });
        assert_eq!(q.recv().await, "snapshot");
    }
}
