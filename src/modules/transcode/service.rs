use super::correlator::{CompletionCorrelator, CorrelationError};
use super::dto::{UploadRequest, UploadResponse};
use super::events::{output_key_for, upload_key_for};
use crate::common::error::TranscodeError;
use crate::common::upload::ObjectUploader;
use crate::infrastructure::storage::{ObjectIdentity, ObjectStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use validator::Validate;

#[derive(Debug, Clone)]
pub struct TranscodeSettings {
    pub input_bucket: String,
    pub output_bucket: String,
    pub job_timeout: Duration,
    pub presigned_url_ttl: Duration,
}

/// Runs one upload request through the pipeline: presign, upload, wait for the worker, presign
/// the result. Each step either advances or ends the request; nothing is retried here.
pub struct TranscodeService {
    storage: Arc<dyn ObjectStore>,
    uploader: ObjectUploader,
    correlator: CompletionCorrelator,
    settings: TranscodeSettings,
}

impl TranscodeService {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        uploader: ObjectUploader,
        correlator: CompletionCorrelator,
        settings: TranscodeSettings,
    ) -> Self {
        Self {
            storage,
            uploader,
            correlator,
            settings,
        }
    }

    pub async fn process_upload(
        &self,
        req: UploadRequest,
        cancel: &CancellationToken,
    ) -> Result<UploadResponse, TranscodeError> {
        req.validate()
            .map_err(|e| TranscodeError::Validation(e.to_string()))?;

        // 1. Presign the upload
        let input = ObjectIdentity::new(&self.settings.input_bucket, upload_key_for(&req.filepath));
        let upload_url = self
            .storage
            .issue_upload_url(
                &input,
                &req.content_type,
                &req.target_format,
                self.settings.presigned_url_ttl,
            )
            .await?;
        info!(object = %input, "Upload URL generated");

        // 2. Transfer the file
        self.uploader
            .upload(&upload_url, Path::new(&req.filepath), &req.content_type, &req.target_format)
            .await
            .map_err(|e| TranscodeError::Transfer(e.to_string()))?;

        // 3. Wait for the worker's completion notification
        let expected_key = output_key_for(&req.filepath, &req.target_format);
        let notification = self
            .correlator
            .correlate(&expected_key, self.settings.job_timeout, cancel)
            .await
            .map_err(|e| match e {
                CorrelationError::TimedOut { expected_key, elapsed } => {
                    TranscodeError::Timeout { expected_key, elapsed }
                }
                CorrelationError::JobFailed { expected_key, .. } => {
                    TranscodeError::JobFailed { expected_key }
                }
                CorrelationError::Cancelled { expected_key } => {
                    TranscodeError::Cancelled { expected_key }
                }
            })?;

        if !notification.output_bucket.is_empty()
            && notification.output_bucket != self.settings.output_bucket
        {
            warn!(
                reported = %notification.output_bucket,
                configured = %self.settings.output_bucket,
                "Worker reported an unexpected output bucket"
            );
        }

        // 4. Presign the download of the worker's output
        let output = ObjectIdentity::new(&self.settings.output_bucket, &notification.output_key);
        let download_url = self
            .storage
            .issue_download_url(&output, self.settings.presigned_url_ttl)
            .await?;
        info!(object = %output, "Job completed, download URL issued");

        Ok(UploadResponse {
            status: "completed".to_string(),
            download_url,
            output_key: notification.output_key,
            completed_at: notification.completed_at,
        })
    }
}
