use super::{ObjectIdentity, ObjectStore, StorageError, TARGET_FORMAT_METADATA};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Builds the client from the shared AWS config. A custom `endpoint` (MinIO, localstack)
    /// switches to path-style addressing.
    pub fn new(sdk_config: &aws_config::SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder = Builder::from(sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        info!("✅ Connected to S3{}", endpoint.map(|e| format!(" at {e}")).unwrap_or_default());

        Self { client }
    }

    fn presigning(object: &ObjectIdentity, expires_in: Duration) -> Result<PresigningConfig, StorageError> {
        PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::Presign(object.to_string(), e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn issue_upload_url(
        &self,
        object: &ObjectIdentity,
        content_type: &str,
        target_format: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let request = self
            .client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .content_type(content_type)
            .metadata(TARGET_FORMAT_METADATA, target_format)
            .presigned(Self::presigning(object, expires_in)?)
            .await
            .map_err(|e| StorageError::Presign(object.to_string(), DisplayErrorContext(e).to_string()))?;

        debug!(object = %object, "Presigned upload URL issued");
        Ok(request.uri().to_string())
    }

    async fn issue_download_url(
        &self,
        object: &ObjectIdentity,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let request = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .presigned(Self::presigning(object, expires_in)?)
            .await
            .map_err(|e| StorageError::Presign(object.to_string(), DisplayErrorContext(e).to_string()))?;

        debug!(object = %object, "Presigned download URL issued");
        Ok(request.uri().to_string())
    }

    async fn object_metadata(
        &self,
        object: &ObjectIdentity,
    ) -> Result<HashMap<String, String>, StorageError> {
        let head = self
            .client
            .head_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| StorageError::Metadata(object.to_string(), DisplayErrorContext(e).to_string()))?;

        Ok(head.metadata().cloned().unwrap_or_default())
    }
}
