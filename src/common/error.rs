use crate::common::response::ApiError;
use crate::infrastructure::storage::StorageError;
use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Terminal outcomes of one upload request, each mapped to a distinct response.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Signing(#[from] StorageError),

    #[error("Upload failed: {0}")]
    Transfer(String),

    #[error("timeout waiting for job completion of {expected_key} after {:.1}s", .elapsed.as_secs_f64())]
    Timeout { expected_key: String, elapsed: Duration },

    #[error("transcoding job for {expected_key} reported status failed")]
    JobFailed { expected_key: String },

    #[error("request cancelled while waiting for {expected_key}")]
    Cancelled { expected_key: String },
}

impl From<TranscodeError> for ApiError {
    fn from(err: TranscodeError) -> Self {
        let message = err.to_string();
        match err {
            TranscodeError::Validation(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "Invalid upload request", message)
            }
            TranscodeError::Signing(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not generate presigned URL",
                message,
            ),
            TranscodeError::Transfer(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed", message)
            }
            TranscodeError::Timeout { .. } => ApiError::new(
                StatusCode::REQUEST_TIMEOUT,
                "Job processing timeout or failed",
                message,
            ),
            TranscodeError::JobFailed { .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, "Job processing failed", message)
            }
            TranscodeError::Cancelled { .. } => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Request cancelled", message)
            }
        }
    }
}
