use anyhow::Context;
use aws_config::BehaviorVersion;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use transcode_gateway::common::upload::ObjectUploader;
use transcode_gateway::config::settings::AppConfig;
use transcode_gateway::infrastructure::queue::{MessageQueue, SqsQueue};
use transcode_gateway::infrastructure::storage::{ObjectStore, S3Storage};
use transcode_gateway::modules::transcode::dispatcher::JobDispatcher;
use transcode_gateway::workers::dispatcher::start_dispatch_worker;
use transcode_gateway::{AppState, create_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("invalid configuration")?;

    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let storage: Arc<dyn ObjectStore> =
        Arc::new(S3Storage::new(&sdk_config, config.s3_endpoint.as_deref()));
    let sqs = aws_sdk_sqs::Client::new(&sdk_config);
    let completions: Arc<dyn MessageQueue> =
        Arc::new(SqsQueue::new(sqs.clone(), &config.completion_queue_url));

    let shutdown = CancellationToken::new();

    let worker = match (&config.storage_event_queue_url, &config.work_queue_url) {
        (Some(events_url), Some(work_url)) => {
            let events: Arc<dyn MessageQueue> = Arc::new(SqsQueue::new(sqs.clone(), events_url));
            let work: Arc<dyn MessageQueue> = Arc::new(SqsQueue::new(sqs.clone(), work_url));
            let dispatcher = Arc::new(JobDispatcher::new(
                storage.clone(),
                work,
                config.output_bucket.clone(),
            ));
            Some(tokio::spawn(start_dispatch_worker(events, dispatcher, shutdown.clone())))
        }
        _ => {
            info!("Storage-event dispatch worker disabled");
            None
        }
    };

    let port = config.server_port;
    let state = AppState::new(config, storage, completions, ObjectUploader::default(), shutdown.clone());
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("server error")?;

    if let Some(worker) = worker {
        if let Err(e) = worker.await {
            warn!(error = %e, "Dispatch worker ended abnormally");
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM and cancels every in-flight correlation.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
