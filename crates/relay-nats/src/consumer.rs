use crate::traits::{JetStreamConsumer, PullConsumer};
use anyhow::Result;
use async_nats::jetstream::{self, AckKind, Message};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Disposition for one fetched batch.
///
/// The relay forwards batch-granular, so acknowledgment is batch-granular
/// too: either every message in the batch is committed, or every message is
/// handed back for redelivery as a unit.
#[derive(Debug)]
pub enum BatchDisposition {
    /// Ack every message; the batch reached the work queue
    Commit,
    /// Nak every message; the log substrate should redeliver the batch
    Redeliver { reason: String },
}

/// Handler invoked once per fetched batch.
/// The handler owns all fault handling and reports only a disposition.
pub type BatchHandler =
    Box<dyn Fn(&[Message]) -> BoxFuture<'static, BatchDisposition> + Send + Sync>;

/// Pull-based delivery loop that feeds batches of log records to a handler.
///
/// This is the log substrate's push mechanism from the forwarder's point of
/// view: batch size and wait window decide when a batch triggers, the
/// handler never does.
pub struct DeliveryConsumer {
    consumer: Box<dyn PullConsumer>,
    batch_size: usize,
    max_wait: Duration,
    handler: BatchHandler,
}

impl DeliveryConsumer {
    pub async fn new(
        client: Arc<dyn JetStreamConsumer>,
        stream_name: &str,
        consumer_name: &str,
        subject_filter: &str,
        batch_size: usize,
        max_wait_secs: u64,
        handler: BatchHandler,
    ) -> Result<Self> {
        debug!(
            stream = stream_name,
            consumer = consumer_name,
            subject = subject_filter,
            "Creating delivery consumer"
        );

        let consumer = client
            .create_consumer(
                jetstream::consumer::pull::Config {
                    name: Some(consumer_name.to_string()),
                    durable_name: Some(consumer_name.to_string()),
                    filter_subject: subject_filter.to_string(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
                stream_name,
            )
            .await?;

        info!(
            stream = stream_name,
            consumer = consumer_name,
            "Delivery consumer created"
        );

        Ok(Self {
            consumer,
            batch_size,
            max_wait: Duration::from_secs(max_wait_secs),
            handler,
        })
    }

    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!("Starting delivery loop");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("Received shutdown signal, stopping delivery loop");
                    break;
                }
                result = self.fetch_and_dispatch() => {
                    if let Err(e) = result {
                        error!(error = %e, "Error dispatching batch");
                        // Keep the loop alive; the batch stays unacked and
                        // will be redelivered
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        info!("Delivery loop stopped gracefully");
        Ok(())
    }

    async fn fetch_and_dispatch(&self) -> Result<()> {
        let messages = self
            .consumer
            .fetch_messages(self.batch_size, self.max_wait)
            .await?;

        if messages.is_empty() {
            debug!("No messages in delivery window");
            return Ok(());
        }

        debug!(message_count = messages.len(), "Dispatching delivery batch");

        match (self.handler)(&messages).await {
            BatchDisposition::Commit => {
                for msg in &messages {
                    if let Err(e) = msg.ack().await {
                        error!(error = %e, subject = %msg.subject, "Failed to acknowledge message");
                    }
                }
                debug!(message_count = messages.len(), "Committed delivery batch");
            }
            BatchDisposition::Redeliver { reason } => {
                warn!(
                    message_count = messages.len(),
                    reason = %reason,
                    "Rejecting delivery batch for redelivery"
                );
                for msg in &messages {
                    if let Err(e) = msg.ack_with(AckKind::Nak(None)).await {
                        error!(error = %e, subject = %msg.subject, "Failed to reject message");
                    }
                }
            }
        }

        Ok(())
    }
}
