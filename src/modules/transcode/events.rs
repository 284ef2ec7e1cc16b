use crate::infrastructure::storage::ObjectIdentity;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

/// Published to the work queue for every object that lands in the input bucket.
///
/// Delivery is at-least-once, so a worker keys its idempotency on `(input_bucket, input_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub input_bucket: String,
    pub input_key: String,
    pub output_bucket: String,
    pub target_format: String,
}

impl JobDescriptor {
    /// The key under which the worker writes its output.
    pub fn expected_output_key(&self) -> String {
        output_key_for(&self.input_key, &self.target_format)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Published by the worker to the completion queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobNotification {
    pub status: JobStatus,
    pub output_key: String,
    #[serde(default)]
    pub output_bucket: String,
    #[serde(default)]
    pub input_bucket: String,
    #[serde(default)]
    pub input_key: String,
    #[serde(default)]
    pub target_format: String,
    #[serde(default)]
    pub completed_at: String,
}

/// Output key for `source` converted to `target_format`: the base file name with its last
/// extension replaced. `clips/movie.mov` + `mp4` gives `movie.mp4`.
pub fn output_key_for(source: &str, target_format: &str) -> String {
    let file_name = source.rsplit(['/', '\\']).next().unwrap_or(source);
    let stem = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    };
    format!("{stem}.{target_format}")
}

/// Object key the upload is stored under: the base file name of the local path.
pub fn upload_key_for(source: &str) -> String {
    source
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source)
        .to_string()
}

// --- Storage-arrival notifications (S3 event format) ---

#[derive(Debug, Deserialize)]
pub struct StorageEventNotification {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageEventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct StorageEventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: String,
    pub s3: StorageEventEntity,
}

#[derive(Debug, Deserialize)]
pub struct StorageEventEntity {
    pub bucket: StorageEventBucket,
    pub object: StorageEventObject,
}

#[derive(Debug, Deserialize)]
pub struct StorageEventBucket {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StorageEventObject {
    pub key: String,
}

impl StorageEventNotification {
    /// Objects created by this notification. Keys arrive form-encoded and are decoded here;
    /// records for anything but object creation are dropped.
    pub fn arrivals(&self) -> Vec<ObjectIdentity> {
        self.records
            .iter()
            .filter(|r| r.event_name.is_empty() || r.event_name.starts_with("ObjectCreated"))
            .map(|r| ObjectIdentity::new(&r.s3.bucket.name, decode_event_key(&r.s3.object.key)))
            .collect()
    }
}

fn decode_event_key(key: &str) -> String {
    let spaced = key.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
