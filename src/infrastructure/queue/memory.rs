//! In-process queue with SQS-like visibility semantics.
//!
//! A received message stays in the queue, hidden until its visibility timeout lapses or it is
//! deleted with the receipt handle of its latest delivery. Each redelivery issues a fresh receipt
//! handle, so a stale handle can no longer delete the message. Used by tests and local runs.

use super::{MessageQueue, QueueError, QueueMessage, ReceiveOptions};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug)]
struct Entry {
    message_id: String,
    body: String,
    receipt_handle: Option<String>,
    visible_at: Instant,
    receive_count: u32,
}

#[derive(Debug, Default)]
pub struct InMemoryQueue {
    entries: Mutex<Vec<Entry>>,
    arrivals: Notify,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of messages still in the queue, visible or not.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bodies of every message still in the queue, in arrival order.
    pub fn bodies(&self) -> Vec<String> {
        self.entries().iter().map(|e| e.body.clone()).collect()
    }

    /// Total deliveries across the messages still queued.
    pub fn receive_count(&self) -> u32 {
        self.entries().iter().map(|e| e.receive_count).sum()
    }

    /// Leases up to `max_messages` visible entries. Also returns when the next hidden entry
    /// becomes visible again so a waiting receiver can wake for it.
    fn lease_visible(&self, options: &ReceiveOptions) -> (Vec<QueueMessage>, Option<Instant>) {
        let now = Instant::now();
        let mut entries = self.entries();
        let mut leased = Vec::new();
        let mut next_visible: Option<Instant> = None;

        for entry in entries.iter_mut() {
            if entry.visible_at > now {
                next_visible = Some(next_visible.map_or(entry.visible_at, |t| t.min(entry.visible_at)));
                continue;
            }
            if leased.len() >= options.max_messages {
                break;
            }

            let receipt_handle = Uuid::new_v4().to_string();
            entry.receipt_handle = Some(receipt_handle.clone());
            entry.visible_at = now + options.visibility_timeout;
            entry.receive_count += 1;

            leased.push(QueueMessage {
                message_id: entry.message_id.clone(),
                receipt_handle,
                body: entry.body.clone(),
            });
        }

        (leased, next_visible)
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn receive(&self, options: &ReceiveOptions) -> Result<Vec<QueueMessage>, QueueError> {
        let deadline = Instant::now() + options.wait_time;

        loop {
            // Registered before the check so a send in between still wakes us.
            let arrived = self.arrivals.notified();

            let (leased, next_visible) = self.lease_visible(options);
            if !leased.is_empty() || Instant::now() >= deadline {
                return Ok(leased);
            }

            let wake_at = next_visible.map_or(deadline, |t| t.min(deadline));
            tokio::select! {
                _ = arrived => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.entries()
            .retain(|e| e.receipt_handle.as_deref() != Some(receipt_handle));
        Ok(())
    }

    async fn send(&self, body: &str) -> Result<String, QueueError> {
        let message_id = Uuid::new_v4().to_string();
        self.entries().push(Entry {
            message_id: message_id.clone(),
            body: body.to_string(),
            receipt_handle: None,
            visible_at: Instant::now(),
            receive_count: 0,
        });
        self.arrivals.notify_waiters();
        Ok(message_id)
    }
}
