use std::env;
use std::str::FromStr;
use tracing::warn;

pub enum EnvKey {
    ServerPort,
    InputBucket,
    OutputBucket,
    CompletionQueueUrl,
    WorkQueueUrl,
    StorageEventQueueUrl,
    S3Endpoint,
    JobTimeoutSecs,
    PresignedUrlTtlSecs,
    PollIntervalSecs,
    SurfaceWorkerFailures,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::InputBucket => "S3_INPUT_BUCKET_NAME",
            EnvKey::OutputBucket => "S3_OUTPUT_BUCKET_NAME",
            EnvKey::CompletionQueueUrl => "JOB_NOTIFICATION_QUEUE_URL",
            EnvKey::WorkQueueUrl => "SQS_QUEUE_URL",
            EnvKey::StorageEventQueueUrl => "STORAGE_EVENT_QUEUE_URL",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::JobTimeoutSecs => "JOB_TIMEOUT_SECS",
            EnvKey::PresignedUrlTtlSecs => "PRESIGNED_URL_TTL_SECS",
            EnvKey::PollIntervalSecs => "POLL_INTERVAL_SECS",
            EnvKey::SurfaceWorkerFailures => "SURFACE_WORKER_FAILURES",
        }
    }
}

/// Reads variables through `lookup`, treating an empty value as unset.
pub struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    pub fn get(&self, key: EnvKey) -> Option<String> {
        (self.lookup)(key.as_str()).filter(|v| !v.trim().is_empty())
    }

    /// Falls back to `default` when the variable is unset or does not parse.
    pub fn get_parsed<T: FromStr>(&self, key: EnvKey, default: T) -> T {
        let name = key.as_str();
        match self.get(key) {
            Some(val) => val.trim().parse::<T>().unwrap_or_else(|_| {
                warn!(variable = name, value = %val, "Unparseable value, using default");
                default
            }),
            None => default,
        }
    }
}

/// Reader over the process environment.
pub fn process() -> EnvReader<impl Fn(&str) -> Option<String>> {
    EnvReader::new(|name: &str| env::var(name).ok())
}
