use crate::config::env::{self, EnvKey, EnvReader};
use crate::modules::transcode::correlator::{CorrelatorSettings, MAX_JOB_TIMEOUT};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub input_bucket: String,
    pub output_bucket: String,
    pub completion_queue_url: String,
    pub work_queue_url: Option<String>,
    pub storage_event_queue_url: Option<String>,
    pub s3_endpoint: Option<String>,
    pub job_timeout: Duration,
    pub presigned_url_ttl: Duration,
    pub correlation: CorrelatorSettings,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_env(&env::process())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::from_env(&EnvReader::new(lookup))
    }

    fn from_env<F: Fn(&str) -> Option<String>>(vars: &EnvReader<F>) -> Result<Self, ConfigError> {
        let correlation = CorrelatorSettings {
            poll_interval: Duration::from_secs(vars.get_parsed(EnvKey::PollIntervalSecs, 2)),
            surface_worker_failures: vars.get_parsed(EnvKey::SurfaceWorkerFailures, false),
            ..CorrelatorSettings::default()
        };

        let mut job_timeout = Duration::from_secs(vars.get_parsed(EnvKey::JobTimeoutSecs, 300));
        if job_timeout > MAX_JOB_TIMEOUT {
            warn!(
                requested_secs = job_timeout.as_secs(),
                max_secs = MAX_JOB_TIMEOUT.as_secs(),
                "JOB_TIMEOUT_SECS too large, capping"
            );
            job_timeout = MAX_JOB_TIMEOUT;
        }

        Ok(Self {
            server_port: vars.get_parsed(EnvKey::ServerPort, 3000),
            input_bucket: required(vars, EnvKey::InputBucket)?,
            output_bucket: required(vars, EnvKey::OutputBucket)?,
            completion_queue_url: required(vars, EnvKey::CompletionQueueUrl)?,
            work_queue_url: vars.get(EnvKey::WorkQueueUrl),
            storage_event_queue_url: vars.get(EnvKey::StorageEventQueueUrl),
            s3_endpoint: vars.get(EnvKey::S3Endpoint),
            job_timeout,
            presigned_url_ttl: Duration::from_secs(vars.get_parsed(EnvKey::PresignedUrlTtlSecs, 900)),
            correlation,
        })
    }
}

fn required<F: Fn(&str) -> Option<String>>(
    vars: &EnvReader<F>,
    key: EnvKey,
) -> Result<String, ConfigError> {
    let name = key.as_str();
    vars.get(key).ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const REQUIRED: [&str; 3] = [
        "S3_INPUT_BUCKET_NAME",
        "S3_OUTPUT_BUCKET_NAME",
        "JOB_NOTIFICATION_QUEUE_URL",
    ];

    fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("S3_INPUT_BUCKET_NAME", "in".to_string()),
            ("S3_OUTPUT_BUCKET_NAME", "out".to_string()),
            (
                "JOB_NOTIFICATION_QUEUE_URL",
                "https://sqs.us-east-1.amazonaws.com/1/done".to_string(),
            ),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.input_bucket, "in");
        assert_eq!(config.output_bucket, "out");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.job_timeout, Duration::from_secs(300));
        assert_eq!(config.presigned_url_ttl, Duration::from_secs(900));
        assert_eq!(config.correlation.poll_interval, Duration::from_secs(2));
        assert!(!config.correlation.surface_worker_failures);
        assert!(config.work_queue_url.is_none());
        assert!(config.storage_event_queue_url.is_none());
    }

    #[test]
    fn missing_required_var_is_an_error() {
        for name in REQUIRED {
            let mut vars = base_vars();
            vars.remove(name);
            assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(name));
        }
    }

    #[test]
    fn blank_required_var_counts_as_missing() {
        for name in REQUIRED {
            let mut vars = base_vars();
            vars.insert(name, "   ".to_string());
            assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(name));
        }
    }

    #[test]
    fn oversized_job_timeout_is_capped() {
        let mut vars = base_vars();
        vars.insert("JOB_TIMEOUT_SECS", u64::MAX.to_string());

        assert_eq!(load(&vars).unwrap().job_timeout, MAX_JOB_TIMEOUT);
    }

    #[test]
    fn unparseable_values_fall_back_to_defaults() {
        let mut vars = base_vars();
        vars.insert("SURFACE_WORKER_FAILURES", "1".to_string());
        vars.insert("APP_PORT", "eighty".to_string());
        vars.insert("POLL_INTERVAL_SECS", "5".to_string());

        let config = load(&vars).unwrap();
        assert!(!config.correlation.surface_worker_failures);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.correlation.poll_interval, Duration::from_secs(5));
    }
}
