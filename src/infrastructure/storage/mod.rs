use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod s3;

pub use s3::S3Storage;

/// Metadata attribute carrying the requested output format of an uploaded object.
pub const TARGET_FORMAT_METADATA: &str = "target-format";

/// Transport-level header for [`TARGET_FORMAT_METADATA`].
pub const TARGET_FORMAT_HEADER: &str = "x-amz-meta-target-format";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to presign request for {0}: {1}")]
    Presign(String, String),

    #[error("Failed to read metadata for {0}: {1}")]
    Metadata(String, String),
}

/// Names a stored object within a bucket namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentity {
    pub bucket: String,
    pub key: String,
}

impl ObjectIdentity {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Object storage capability: pre-signed handles for upload and download, plus a metadata read
/// for the storage-event side.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Issues a URL authorizing one PUT of `object` with the given content type and
    /// `target-format` metadata.
    async fn issue_upload_url(
        &self,
        object: &ObjectIdentity,
        content_type: &str,
        target_format: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;

    /// Issues a URL authorizing GET of `object`.
    async fn issue_download_url(
        &self,
        object: &ObjectIdentity,
        expires_in: Duration,
    ) -> Result<String, StorageError>;

    /// User metadata of `object`, keyed without the transport prefix.
    async fn object_metadata(
        &self,
        object: &ObjectIdentity,
    ) -> Result<HashMap<String, String>, StorageError>;
}
