use super::events::JobDescriptor;
use crate::infrastructure::queue::{MessageQueue, QueueError};
use crate::infrastructure::storage::{ObjectIdentity, ObjectStore, StorageError, TARGET_FORMAT_METADATA};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Output format used when an object carries no `target-format` metadata.
pub const DEFAULT_TARGET_FORMAT: &str = "mp4";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Metadata(#[from] StorageError),

    #[error("Error marshalling job message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Publish(#[from] QueueError),

    #[error("{failed} of {total} storage records failed to dispatch")]
    Batch { failed: usize, total: usize },
}

/// Turns storage-arrival records into job descriptors on the work queue.
pub struct JobDispatcher {
    storage: Arc<dyn ObjectStore>,
    work_queue: Arc<dyn MessageQueue>,
    output_bucket: String,
}

impl JobDispatcher {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        work_queue: Arc<dyn MessageQueue>,
        output_bucket: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            work_queue,
            output_bucket: output_bucket.into(),
        }
    }

    /// Publishes the job for one arrived object and returns the queue message id.
    pub async fn dispatch(&self, object: &ObjectIdentity) -> Result<String, DispatchError> {
        info!(object = %object, "Processing storage record");

        let metadata = self.storage.object_metadata(object).await?;
        let target_format = metadata
            .get(TARGET_FORMAT_METADATA)
            .filter(|f| !f.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_TARGET_FORMAT.to_string());

        let job = JobDescriptor {
            input_bucket: object.bucket.clone(),
            input_key: object.key.clone(),
            output_bucket: self.output_bucket.clone(),
            target_format,
        };
        let body = serde_json::to_string(&job)?;

        let message_id = self.work_queue.send(&body).await?;
        info!(object = %object, message_id = %message_id, target_format = %job.target_format, "Job dispatched");
        Ok(message_id)
    }

    /// Dispatches every record independently. A failed record does not stop the rest, but the
    /// batch as a whole reports failure so the trigger redelivers it.
    pub async fn dispatch_batch(&self, objects: &[ObjectIdentity]) -> Result<usize, DispatchError> {
        let mut failed = 0;
        for object in objects {
            if let Err(e) = self.dispatch(object).await {
                error!(object = %object, error = %e, "Failed to dispatch job");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(DispatchError::Batch {
                failed,
                total: objects.len(),
            });
        }
        Ok(objects.len())
    }
}
