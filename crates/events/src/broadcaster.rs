//! Fan-out of task lifecycle events to live subscribers.
//!
//! [`TaskBroadcaster`] keeps one unbounded channel per subscriber. It is
//! designed to be shared via `Arc<TaskBroadcaster>`; the subscriber map has
//! its own lock, independent of the scheduler's state lock.

use std::collections::HashMap;

use lumen_core::task::TaskSnapshot;
use lumen_core::task_events::TaskEvent;
use lumen_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};

/// Opaque handle identifying one subscriber.
pub type SubscriberId = uuid::Uuid;

/// What a new subscriber receives: the recent tasks as of subscription,
/// then every later event in emission order.
pub struct Subscription {
    pub id: SubscriberId,
    /// Most recent tasks first.
    pub snapshot: Vec<TaskSnapshot>,
    pub events: mpsc::UnboundedReceiver<TaskEvent>,
}

struct Subscriber {
    sender: mpsc::UnboundedSender<TaskEvent>,
    connected_at: Timestamp,
}

pub struct TaskBroadcaster {
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
}

impl TaskBroadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a subscriber that starts from `snapshot`.
    ///
    /// Callers that need gap-free delivery must take the snapshot and call
    /// this while holding whatever lock serializes their emissions.
    pub async fn subscribe(&self, snapshot: Vec<TaskSnapshot>) -> Subscription {
        let id = SubscriberId::new_v4();
        let (sender, events) = mpsc::unbounded_channel();
        self.subscribers.write().await.insert(
            id,
            Subscriber {
                sender,
                connected_at: chrono::Utc::now(),
            },
        );
        tracing::debug!(subscriber_id = %id, "Task event subscriber added");
        Subscription {
            id,
            snapshot,
            events,
        }
    }

    /// Remove a subscriber. Returns whether it was still registered;
    /// calling it twice is harmless.
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.write().await.remove(&id);
        if let Some(sub) = &removed {
            let connected_secs = (chrono::Utc::now() - sub.connected_at).num_seconds();
            tracing::debug!(subscriber_id = %id, connected_secs, "Task event subscriber removed");
        }
        removed.is_some()
    }

    /// Deliver an event to every subscriber. Never blocks on a slow reader.
    ///
    /// Subscribers whose receiver has been dropped are removed. Returns the
    /// number of subscribers the event was delivered to.
    pub async fn emit(&self, event: TaskEvent) -> usize {
        let mut delivered = 0;
        let mut gone = Vec::new();
        {
            let subs = self.subscribers.read().await;
            for (id, sub) in subs.iter() {
                if sub.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    gone.push(*id);
                }
            }
        }

        if !gone.is_empty() {
            let mut subs = self.subscribers.write().await;
            for id in &gone {
                subs.remove(id);
            }
            tracing::debug!(count = gone.len(), "Dropped disconnected task event subscribers");
        }

        delivered
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Drop every subscriber, closing their receivers.
    ///
    /// Used during graceful shutdown so WebSocket loops can finish.
    pub async fn close_all(&self) {
        let mut subs = self.subscribers.write().await;
        let count = subs.len();
        subs.clear();
        tracing::info!(count, "Closed all task event subscriptions");
    }
}

impl Default for TaskBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
