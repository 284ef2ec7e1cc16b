//! Matches completion notifications on a shared queue against the output key one request is
//! waiting for.
//!
//! Every waiting request runs its own correlator over the same completion queue. A correlator
//! leases each message it reads for the visibility timeout, deletes only the message it matched,
//! and leaves everything else to reappear for other waiters. The queue is treated as an unordered
//! multiset: no arrival order or latency is assumed.

use super::events::{JobNotification, JobStatus};
use crate::infrastructure::queue::{MAX_WAIT_TIME, MessageQueue, QueueMessage, ReceiveOptions};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Longest wait a single request may ask for.
pub const MAX_JOB_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct CorrelatorSettings {
    /// Messages requested per receive.
    pub max_messages: usize,
    /// Long-poll wait per receive, further clamped to the time left before the deadline.
    pub wait_time: Duration,
    /// Lease on each received message.
    pub visibility_timeout: Duration,
    /// Pause between polls that found no match.
    pub poll_interval: Duration,
    /// End the wait as soon as the worker reports `failed` for the expected key.
    pub surface_worker_failures: bool,
}

impl Default for CorrelatorSettings {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait_time: MAX_WAIT_TIME,
            visibility_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
            surface_worker_failures: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("timeout waiting for job completion of {expected_key}")]
    TimedOut {
        expected_key: String,
        elapsed: Duration,
    },

    #[error("job for {expected_key} failed")]
    JobFailed {
        expected_key: String,
        notification: JobNotification,
    },

    #[error("correlation for {expected_key} cancelled")]
    Cancelled { expected_key: String },
}

enum Inspection {
    Matched(JobNotification),
    Failed(JobNotification),
    Skip,
}

pub struct CompletionCorrelator {
    queue: Arc<dyn MessageQueue>,
    settings: CorrelatorSettings,
}

impl CompletionCorrelator {
    pub fn new(queue: Arc<dyn MessageQueue>, settings: CorrelatorSettings) -> Self {
        Self { queue, settings }
    }

    /// Polls until a `completed` notification for `expected_output_key` arrives, `timeout`
    /// elapses, or `cancel` fires.
    pub async fn correlate(
        &self,
        expected_output_key: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<JobNotification, CorrelationError> {
        let timeout = timeout.min(MAX_JOB_TIMEOUT);
        let started = Instant::now();
        let deadline = started + timeout;
        let cancelled = || CorrelationError::Cancelled {
            expected_key: expected_output_key.to_string(),
        };

        info!(expected_key = %expected_output_key, timeout_secs = timeout.as_secs(), "Waiting for job completion");

        while Instant::now() < deadline {
            let options = ReceiveOptions {
                max_messages: self.settings.max_messages,
                wait_time: self
                    .settings
                    .wait_time
                    .min(deadline.saturating_duration_since(Instant::now())),
                visibility_timeout: self.settings.visibility_timeout,
            };

            let received = tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled()),
                received = self.queue.receive(&options) => received,
            };

            match received {
                Ok(messages) => {
                    debug!(expected_key = %expected_output_key, count = messages.len(), "Inspecting completion messages");
                    for message in &messages {
                        match self.inspect(message, expected_output_key) {
                            Inspection::Matched(notification) => {
                                self.acknowledge(message).await;
                                info!(
                                    expected_key = %expected_output_key,
                                    elapsed_ms = started.elapsed().as_millis() as u64,
                                    "Job completed"
                                );
                                return Ok(notification);
                            }
                            Inspection::Failed(notification) => {
                                self.acknowledge(message).await;
                                warn!(expected_key = %expected_output_key, "Worker reported job failure");
                                return Err(CorrelationError::JobFailed {
                                    expected_key: expected_output_key.to_string(),
                                    notification,
                                });
                            }
                            Inspection::Skip => {}
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Error receiving completion messages"),
            }

            let resume_at = (Instant::now() + self.settings.poll_interval).min(deadline);
            tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = sleep_until(resume_at) => {}
            }
        }

        let elapsed = started.elapsed();
        warn!(expected_key = %expected_output_key, elapsed_secs = elapsed.as_secs(), "Timed out waiting for job completion");
        Err(CorrelationError::TimedOut {
            expected_key: expected_output_key.to_string(),
            elapsed,
        })
    }

    fn inspect(&self, message: &QueueMessage, expected_output_key: &str) -> Inspection {
        let notification = match serde_json::from_str::<JobNotification>(&message.body) {
            Ok(n) => n,
            Err(e) => {
                // Left for its lease to lapse; a dead-letter policy may still pick it up.
                warn!(message_id = %message.message_id, error = %e, "Error parsing completion message");
                return Inspection::Skip;
            }
        };

        if notification.output_key != expected_output_key {
            return Inspection::Skip;
        }

        match notification.status {
            JobStatus::Completed => Inspection::Matched(notification),
            JobStatus::Failed if self.settings.surface_worker_failures => {
                Inspection::Failed(notification)
            }
            _ => Inspection::Skip,
        }
    }

    /// A failed delete only means another waiter may see the message again.
    async fn acknowledge(&self, message: &QueueMessage) {
        if let Err(e) = self.queue.delete(&message.receipt_handle).await {
            error!(message_id = %message.message_id, error = %e, "Error deleting completion message");
        }
    }
}
