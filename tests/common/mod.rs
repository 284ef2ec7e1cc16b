//! Local stand-ins for object storage and the transcoding worker.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    routing::put,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use transcode_gateway::AppState;
use transcode_gateway::common::upload::ObjectUploader;
use transcode_gateway::config::settings::AppConfig;
use transcode_gateway::infrastructure::queue::{InMemoryQueue, MessageQueue, ReceiveOptions};
use transcode_gateway::infrastructure::storage::{
    ObjectIdentity, ObjectStore, StorageError, TARGET_FORMAT_HEADER, TARGET_FORMAT_METADATA,
};
use transcode_gateway::modules::transcode::correlator::CorrelatorSettings;
use transcode_gateway::modules::transcode::events::{JobDescriptor, JobStatus};

pub const INPUT_BUCKET: &str = "media-input";
pub const OUTPUT_BUCKET: &str = "media-output";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub chunked: bool,
    pub metadata: HashMap<String, String>,
}

#[derive(Default)]
struct Objects {
    stored: HashMap<ObjectIdentity, StoredObject>,
}

/// Object storage served over a local HTTP listener. PUTs to issued upload URLs land in memory
/// and emit an `ObjectCreated:Put` event onto `events`, the way a bucket notification would.
pub struct FakeStorage {
    base_url: String,
    objects: Arc<Mutex<Objects>>,
    pub events: Arc<InMemoryQueue>,
    pub reject_uploads: bool,
    pub fail_signing: bool,
}

#[derive(Clone)]
struct ServerState {
    objects: Arc<Mutex<Objects>>,
    events: Arc<InMemoryQueue>,
    reject_uploads: bool,
}

impl FakeStorage {
    pub async fn start() -> Arc<Self> {
        Self::start_with(false, false).await
    }

    pub async fn start_with(reject_uploads: bool, fail_signing: bool) -> Arc<Self> {
        let objects = Arc::new(Mutex::new(Objects::default()));
        let events = Arc::new(InMemoryQueue::new());

        let router = Router::new()
            .route("/{bucket}/{key}", put(put_object))
            .with_state(ServerState {
                objects: objects.clone(),
                events: events.clone(),
                reject_uploads,
            });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Arc::new(Self {
            base_url: format!("http://{addr}"),
            objects,
            events,
            reject_uploads,
            fail_signing,
        })
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .stored
            .get(&ObjectIdentity::new(bucket, key))
            .cloned()
    }

    /// Seeds an object as though it had been uploaded out of band.
    pub fn insert_metadata(&self, bucket: &str, key: &str, metadata: HashMap<String, String>) {
        self.objects.lock().unwrap().stored.insert(
            ObjectIdentity::new(bucket, key),
            StoredObject {
                bytes: Bytes::new(),
                content_type: None,
                content_length: None,
                chunked: false,
                metadata,
            },
        );
    }
}

async fn put_object(
    State(state): State<ServerState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if state.reject_uploads {
        return StatusCode::FORBIDDEN;
    }

    let header_value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let mut metadata = HashMap::new();
    if let Some(format) = header_value(TARGET_FORMAT_HEADER) {
        metadata.insert(TARGET_FORMAT_METADATA.to_string(), format);
    }

    let object = StoredObject {
        bytes: body,
        content_type: header_value(header::CONTENT_TYPE.as_str()),
        content_length: header_value(header::CONTENT_LENGTH.as_str()),
        chunked: headers.contains_key(header::TRANSFER_ENCODING),
        metadata,
    };
    state
        .objects
        .lock()
        .unwrap()
        .stored
        .insert(ObjectIdentity::new(&bucket, &key), object);

    let event = json!({
        "Records": [{
            "eventName": "ObjectCreated:Put",
            "s3": { "bucket": { "name": bucket }, "object": { "key": key } }
        }]
    });
    state.events.send(&event.to_string()).await.unwrap();

    StatusCode::OK
}

#[async_trait]
impl ObjectStore for FakeStorage {
    async fn issue_upload_url(
        &self,
        object: &ObjectIdentity,
        _content_type: &str,
        _target_format: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        if self.fail_signing {
            return Err(StorageError::Presign(object.to_string(), "no credentials".into()));
        }
        Ok(format!(
            "{}/{}/{}?X-Amz-Expires={}",
            self.base_url,
            object.bucket,
            object.key,
            expires_in.as_secs()
        ))
    }

    async fn issue_download_url(
        &self,
        object: &ObjectIdentity,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!(
            "{}/{}/{}?X-Amz-Expires={}&x-id=GetObject",
            self.base_url,
            object.bucket,
            object.key,
            expires_in.as_secs()
        ))
    }

    async fn object_metadata(
        &self,
        object: &ObjectIdentity,
    ) -> Result<HashMap<String, String>, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .stored
            .get(object)
            .map(|o| o.metadata.clone())
            .ok_or_else(|| StorageError::Metadata(object.to_string(), "NotFound".into()))
    }
}

/// Stands in for the transcoding worker: consumes job descriptors and reports `status` for
/// each derived output key.
pub fn spawn_worker(
    work: Arc<InMemoryQueue>,
    completions: Arc<InMemoryQueue>,
    status: JobStatus,
    stop: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let options = ReceiveOptions {
            wait_time: Duration::from_millis(200),
            ..ReceiveOptions::default()
        };
        while !stop.is_cancelled() {
            for message in work.receive(&options).await.unwrap() {
                let job: JobDescriptor = serde_json::from_str(&message.body).unwrap();
                let notification = json!({
                    "status": status,
                    "output_bucket": job.output_bucket,
                    "output_key": job.expected_output_key(),
                    "input_bucket": job.input_bucket,
                    "input_key": job.input_key,
                    "target_format": job.target_format,
                    "completed_at": "2026-10-18T12:00:00Z"
                });
                completions.send(&notification.to_string()).await.unwrap();
                work.delete(&message.receipt_handle).await.unwrap();
            }
        }
    })
}

pub fn test_config(job_timeout: Duration) -> AppConfig {
    AppConfig {
        server_port: 0,
        input_bucket: INPUT_BUCKET.to_string(),
        output_bucket: OUTPUT_BUCKET.to_string(),
        completion_queue_url: "memory://completions".to_string(),
        work_queue_url: None,
        storage_event_queue_url: None,
        s3_endpoint: None,
        job_timeout,
        presigned_url_ttl: Duration::from_secs(900),
        correlation: CorrelatorSettings {
            wait_time: Duration::from_millis(500),
            poll_interval: Duration::from_millis(50),
            ..CorrelatorSettings::default()
        },
    }
}

pub fn test_state(
    config: AppConfig,
    storage: Arc<FakeStorage>,
    completions: Arc<InMemoryQueue>,
    shutdown: CancellationToken,
) -> AppState {
    AppState::new(config, storage, completions, ObjectUploader::default(), shutdown)
}
