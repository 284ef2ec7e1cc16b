use super::{MAX_WAIT_TIME, MessageQueue, QueueError, QueueMessage, ReceiveOptions};
use async_trait::async_trait;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use tracing::{debug, info};

/// SQS allows at most 10 messages per receive call.
const SQS_MAX_BATCH: usize = 10;

#[derive(Clone)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: &str) -> Self {
        info!("✅ Using SQS queue {}", queue_url);
        Self {
            client,
            queue_url: queue_url.to_string(),
        }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive(&self, options: &ReceiveOptions) -> Result<Vec<QueueMessage>, QueueError> {
        // SQS takes whole seconds, capped at its long-polling limit.
        let wait_secs = options.wait_time.min(MAX_WAIT_TIME).as_secs() as i32;
        let max_messages = options.max_messages.clamp(1, SQS_MAX_BATCH) as i32;

        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_secs)
            .visibility_timeout(options.visibility_timeout.as_secs() as i32)
            .send()
            .await
            .map_err(|e| QueueError::Receive(DisplayErrorContext(e).to_string()))?;

        let messages: Vec<QueueMessage> = output
            .messages()
            .iter()
            .filter_map(|m| {
                Some(QueueMessage {
                    message_id: m.message_id().unwrap_or_default().to_string(),
                    receipt_handle: m.receipt_handle()?.to_string(),
                    body: m.body().unwrap_or_default().to_string(),
                })
            })
            .collect();

        debug!(queue = %self.queue_url, count = messages.len(), "Received messages");
        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(DisplayErrorContext(e).to_string()))?;

        Ok(())
    }

    async fn send(&self, body: &str) -> Result<String, QueueError> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::Send(DisplayErrorContext(e).to_string()))?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }
}
