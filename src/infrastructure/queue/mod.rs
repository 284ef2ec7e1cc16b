use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod memory;
pub mod sqs;

pub use memory::InMemoryQueue;
pub use sqs::SqsQueue;

/// Longest long-poll wait a queue receive may request.
pub const MAX_WAIT_TIME: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to receive messages: {0}")]
    Receive(String),

    #[error("Failed to delete message: {0}")]
    Delete(String),

    #[error("Failed to send message: {0}")]
    Send(String),
}

/// A message pulled from a queue. The receipt handle is the lease on this delivery and is
/// what `delete` acknowledges.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ReceiveOptions {
    pub max_messages: usize,
    pub wait_time: Duration,
    pub visibility_timeout: Duration,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait_time: MAX_WAIT_TIME,
            visibility_timeout: Duration::from_secs(30),
        }
    }
}

/// Minimal pull-queue capability: long-poll receive with a visibility lease, acknowledge by
/// receipt handle, and publish.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn receive(&self, options: &ReceiveOptions) -> Result<Vec<QueueMessage>, QueueError>;

    /// Acknowledges a delivery. Deleting an already deleted message is not an error.
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;

    /// Publishes a message body and returns its message id.
    async fn send(&self, body: &str) -> Result<String, QueueError>;
}
