//! Debounced notification dispatch.
//!
//! Gamification events for a user are batched for a short window before
//! delivery so a burst of unlocks lands as one group. Pending batches live in
//! a per-user delayed-task map owned by this dispatcher, with explicit
//! `cancel` and `flush` operations so lifecycle is controllable from tests
//! and shutdown paths.

use super::models::Notification;
use crate::user::UserStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Delivery target for flushed batches. The server wires this to the user
/// store; tests use an in-memory sink.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, user_id: usize, notification: &Notification) -> Result<()>;
}

impl NotificationSink for Arc<dyn UserStore> {
    fn deliver(&self, user_id: usize, notification: &Notification) -> Result<()> {
        self.append_notification(user_id, notification).map(|_| ())
    }
}

struct PendingBatch {
    notifications: Vec<Notification>,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct PendingMap {
    batches: Mutex<HashMap<usize, PendingBatch>>,
}

pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    debounce: Duration,
    pending: Arc<PendingMap>,
}

/// Delivers and removes the user's batch, if any. Failed deliveries are
/// logged and dropped; there is no retry.
fn flush_pending(pending: &PendingMap, sink: &dyn NotificationSink, user_id: usize) {
    let batch = {
        let mut batches = pending.batches.lock().unwrap();
        batches.remove(&user_id)
    };
    let Some(batch) = batch else {
        return;
    };
    batch.timer.abort();

    debug!(
        "Delivering {} notification(s) to user {}",
        batch.notifications.len(),
        user_id
    );
    for notification in &batch.notifications {
        if let Err(e) = sink.deliver(user_id, notification) {
            warn!("Failed to deliver notification to user {}: {}", user_id, e);
        }
    }
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, debounce: Duration) -> Arc<Self> {
        Arc::new(Self {
            sink,
            debounce,
            pending: Arc::new(PendingMap::default()),
        })
    }

    /// Queues a notification for the user and (re)starts their debounce
    /// window. Delivery happens when the window elapses or on `flush`.
    pub fn enqueue(&self, user_id: usize, notification: Notification) {
        let timer = self.spawn_timer(user_id);
        let mut batches = self.pending.batches.lock().unwrap();
        match batches.get_mut(&user_id) {
            Some(batch) => {
                batch.timer.abort();
                batch.timer = timer;
                batch.notifications.push(notification);
            }
            None => {
                batches.insert(
                    user_id,
                    PendingBatch {
                        notifications: vec![notification],
                        timer,
                    },
                );
            }
        }
    }

    fn spawn_timer(&self, user_id: usize) -> JoinHandle<()> {
        let pending = self.pending.clone();
        let sink = self.sink.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            flush_pending(&pending, sink.as_ref(), user_id);
        })
    }

    /// Delivers the user's pending batch immediately.
    pub fn flush(&self, user_id: usize) {
        flush_pending(&self.pending, self.sink.as_ref(), user_id);
    }

    /// Drops the user's pending batch without delivering it.
    pub fn cancel(&self, user_id: usize) {
        let mut batches = self.pending.batches.lock().unwrap();
        if let Some(batch) = batches.remove(&user_id) {
            batch.timer.abort();
        }
    }

    /// Number of queued, not yet delivered notifications for the user.
    pub fn pending_count(&self, user_id: usize) -> usize {
        self.pending
            .batches
            .lock()
            .unwrap()
            .get(&user_id)
            .map_or(0, |batch| batch.notifications.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::models::NotificationKind;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<(usize, Notification)>>,
    }

    impl NotificationSink for RecordingSink {
        fn deliver(&self, user_id: usize, notification: &Notification) -> Result<()> {
            self.delivered
                .lock()
                .unwrap()
                .push((user_id, notification.clone()));
            Ok(())
        }
    }

    fn notification(title: &str) -> Notification {
        Notification {
            id: None,
            kind: NotificationKind::AchievementUnlocked,
            title: title.to_string(),
            body: None,
            data: serde_json::json!({}),
            created: 0,
        }
    }

    #[tokio::test]
    async fn delivers_batch_after_debounce_window() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = NotificationDispatcher::new(sink.clone(), Duration::from_millis(30));

        dispatcher.enqueue(1, notification("a"));
        dispatcher.enqueue(1, notification("b"));
        assert_eq!(dispatcher.pending_count(1), 2);

        tokio::time::sleep(Duration::from_millis(120)).await;

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert_eq!(dispatcher.pending_count(1), 0);
    }

    #[tokio::test]
    async fn flush_delivers_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = NotificationDispatcher::new(sink.clone(), Duration::from_secs(3600));

        dispatcher.enqueue(1, notification("a"));
        dispatcher.flush(1);

        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
        assert_eq!(dispatcher.pending_count(1), 0);

        // Flushing an empty queue is a no-op.
        dispatcher.flush(1);
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancel_drops_the_batch() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = NotificationDispatcher::new(sink.clone(), Duration::from_millis(30));

        dispatcher.enqueue(1, notification("a"));
        dispatcher.cancel(1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn batches_are_per_user() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = NotificationDispatcher::new(sink.clone(), Duration::from_secs(3600));

        dispatcher.enqueue(1, notification("a"));
        dispatcher.enqueue(2, notification("b"));
        dispatcher.flush(1);

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, 1);
        assert_eq!(dispatcher.pending_count(2), 1);
    }
}
