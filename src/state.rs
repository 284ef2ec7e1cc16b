use crate::common::upload::ObjectUploader;
use crate::config::settings::AppConfig;
use crate::infrastructure::queue::MessageQueue;
use crate::infrastructure::storage::ObjectStore;
use crate::modules::transcode::correlator::CompletionCorrelator;
use crate::modules::transcode::service::{TranscodeService, TranscodeSettings};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub transcoder: Arc<TranscodeService>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        completions: Arc<dyn MessageQueue>,
        uploader: ObjectUploader,
        shutdown: CancellationToken,
    ) -> Self {
        let settings = TranscodeSettings {
            input_bucket: config.input_bucket.clone(),
            output_bucket: config.output_bucket.clone(),
            job_timeout: config.job_timeout,
            presigned_url_ttl: config.presigned_url_ttl,
        };
        let correlator = CompletionCorrelator::new(completions, config.correlation.clone());
        let transcoder = TranscodeService::new(storage, uploader, correlator, settings);

        Self {
            transcoder: Arc::new(transcoder),
            shutdown,
        }
    }
}
