use crate::nats::{create_forward_handler, IngestEndpoint};
use relay_domain::{DedupKeying, ForwardService, IngestService, PartitionKeying};
use relay_nats::{DeliveryConsumer, NatsClient, NatsEventLogProducer, NatsWorkQueueProducer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct RelayWorkerConfig {
    pub log_stream: String,
    pub queue_stream: String,
    pub queue_group: String,
    pub ingest_subject: String,
    pub partition_key: String,
    pub partition_by_event_type: bool,
    pub dedup_by_timestamp: bool,
    pub batch_size: usize,
    pub batch_wait_secs: u64,
}

/// The two relay stages wired to their NATS substrates: the ingest endpoint
/// feeding the event log, and the delivery consumer draining it into the
/// work queue. Stages share no state; each runs as its own process.
pub struct RelayWorker {
    ingest_endpoint: IngestEndpoint,
    delivery_consumer: DeliveryConsumer,
}

impl RelayWorker {
    pub async fn new(
        nats_client: Arc<NatsClient>,
        config: RelayWorkerConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing relay worker");

        // Gateway stage: command events → log records
        let log_publisher = nats_client.create_publisher_client();
        let log_producer = Arc::new(NatsEventLogProducer::new(
            log_publisher,
            config.log_stream.clone(),
        ));
        let partitioning = if config.partition_by_event_type {
            PartitionKeying::EventType
        } else {
            PartitionKeying::Fixed(config.partition_key.clone())
        };
        let ingest_service = Arc::new(IngestService::new(log_producer, partitioning));
        let ingest_endpoint = IngestEndpoint::new(
            nats_client.core_client(),
            config.ingest_subject.clone(),
            ingest_service,
        );

        // Forwarder stage: log delivery batches → work queue envelopes
        let queue_publisher = nats_client.create_publisher_client();
        let queue_producer = Arc::new(NatsWorkQueueProducer::new(
            queue_publisher,
            config.queue_stream.clone(),
        ));
        let dedup = if config.dedup_by_timestamp {
            DedupKeying::Timestamp
        } else {
            DedupKeying::ContentHash
        };
        let forward_service = Arc::new(ForwardService::new(
            queue_producer,
            config.queue_group.clone(),
            dedup,
        ));

        let handler = create_forward_handler(forward_service);
        let consumer_client = nats_client.create_consumer_client();
        let delivery_consumer = DeliveryConsumer::new(
            consumer_client,
            &config.log_stream,
            "relay-forwarder",
            &format!("{}.>", config.log_stream),
            config.batch_size,
            config.batch_wait_secs,
            handler,
        )
        .await?;

        info!("Relay worker initialized");

        Ok(Self {
            ingest_endpoint,
            delivery_consumer,
        })
    }

    pub fn into_runner_processes(
        self,
    ) -> Vec<
        Box<
            dyn FnOnce(
                    CancellationToken,
                ) -> std::pin::Pin<
                    Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
                > + Send,
        >,
    > {
        vec![
            // Ingest endpoint
            Box::new({
                let endpoint = self.ingest_endpoint;
                move |ctx| Box::pin(async move { endpoint.run(ctx).await })
            }),
            // Delivery consumer
            Box::new({
                let consumer = self.delivery_consumer;
                move |ctx| Box::pin(async move { consumer.run(ctx).await })
            }),
        ]
    }
}
