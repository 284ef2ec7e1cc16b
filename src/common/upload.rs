use crate::infrastructure::storage::TARGET_FORMAT_HEADER;
use reqwest::{Body, Client, StatusCode, header};
use std::path::Path;
use thiserror::Error;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("bad status: {0}")]
    BadStatus(StatusCode),
}

/// Streams local files into pre-signed PUT URLs.
#[derive(Clone, Default)]
pub struct ObjectUploader {
    http: Client,
}

impl ObjectUploader {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Performs a single PUT of `source` to `url`. The length is sent explicitly so the body is
    /// never chunk-encoded, and the target format travels as object metadata. Only `200 OK`
    /// counts as success.
    pub async fn upload(
        &self,
        url: &str,
        source: &Path,
        content_type: &str,
        target_format: &str,
    ) -> Result<u64, UploadError> {
        let open_err = |e| UploadError::Open {
            path: source.display().to_string(),
            source: e,
        };
        let file = File::open(source).await.map_err(open_err)?;
        let length = file.metadata().await.map_err(open_err)?.len();

        let response = self
            .http
            .put(url)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, length)
            .header(TARGET_FORMAT_HEADER, target_format)
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            error!(status = %response.status(), path = %source.display(), "Upload rejected");
            return Err(UploadError::BadStatus(response.status()));
        }

        info!(bytes = length, path = %source.display(), "Upload successful");
        Ok(length)
    }
}
