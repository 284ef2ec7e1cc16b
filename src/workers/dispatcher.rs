use crate::infrastructure::queue::{MessageQueue, QueueMessage, ReceiveOptions};
use crate::modules::transcode::dispatcher::JobDispatcher;
use crate::modules::transcode::events::StorageEventNotification;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Lease on a storage-event message; covers dispatching a full batch.
const EVENT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(60);

/// Consumes storage-arrival notifications and dispatches a job per created object.
///
/// An event message is deleted only once its whole batch dispatched. On failure it is left to
/// reappear after its visibility timeout, which is what redelivers the batch.
pub async fn start_dispatch_worker(
    events: Arc<dyn MessageQueue>,
    dispatcher: Arc<JobDispatcher>,
    shutdown: CancellationToken,
) {
    info!("📦 Starting storage-event dispatch worker...");

    let options = ReceiveOptions {
        visibility_timeout: EVENT_VISIBILITY_TIMEOUT,
        ..ReceiveOptions::default()
    };

    loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = events.receive(&options) => received,
        };

        let messages = match received {
            Ok(messages) => messages,
            Err(e) => {
                error!(error = %e, "Failed to receive storage events");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(2)) => continue,
                }
            }
        };

        for message in &messages {
            handle_event(events.as_ref(), &dispatcher, message).await;
        }
    }

    info!("📦 Storage-event dispatch worker stopped");
}

async fn handle_event(events: &dyn MessageQueue, dispatcher: &JobDispatcher, message: &QueueMessage) {
    let notification = match serde_json::from_str::<StorageEventNotification>(&message.body) {
        Ok(n) => n,
        Err(e) => {
            // Will never parse; drop it rather than redeliver forever.
            error!(message_id = %message.message_id, error = %e, "Failed to parse storage event");
            acknowledge(events, message).await;
            return;
        }
    };

    let arrivals = notification.arrivals();
    match dispatcher.dispatch_batch(&arrivals).await {
        Ok(count) => {
            info!(message_id = %message.message_id, count, "Storage event processed");
            acknowledge(events, message).await;
        }
        Err(e) => {
            warn!(message_id = %message.message_id, error = %e, "Storage event left for redelivery");
        }
    }
}

async fn acknowledge(events: &dyn MessageQueue, message: &QueueMessage) {
    if let Err(e) = events.delete(&message.receipt_handle).await {
        error!(message_id = %message.message_id, error = %e, "Failed to delete storage event");
    }
}
