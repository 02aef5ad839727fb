use crate::traits::JetStreamPublisher;
use async_nats::HeaderMap;
use async_trait::async_trait;
use bytes::Bytes;
use relay_domain::error::{DomainError, DomainResult};
use relay_domain::producer::WorkQueueProducer;
use relay_domain::record::QueueEnvelope;
use std::sync::Arc;
use tracing::{debug, info};

/// Header the JetStream duplicate window keys on.
const MSG_ID_HEADER: &str = "Nats-Msg-Id";

/// NATS JetStream producer for the work queue.
///
/// The group key becomes the subject tail token, so consumers of one group
/// see its envelopes in publish order; the dedup key rides in the
/// `Nats-Msg-Id` header and is suppressed by the stream's duplicate window.
pub struct NatsWorkQueueProducer {
    jetstream: Arc<dyn JetStreamPublisher>,
    stream_name: String,
}

impl NatsWorkQueueProducer {
    pub fn new(jetstream: Arc<dyn JetStreamPublisher>, stream_name: String) -> Self {
        info!(stream = %stream_name, "Created NatsWorkQueueProducer");
        Self {
            jetstream,
            stream_name,
        }
    }
}

#[async_trait]
impl WorkQueueProducer for NatsWorkQueueProducer {
    async fn enqueue(&self, envelope: &QueueEnvelope) -> DomainResult<()> {
        let subject = format!("{}.{}", self.stream_name, envelope.group_key);

        let mut headers = HeaderMap::new();
        headers.insert(MSG_ID_HEADER, envelope.dedup_key.as_str());

        debug!(
            subject = %subject,
            dedup_key = %envelope.dedup_key,
            size_bytes = envelope.body.len(),
            "Enqueuing envelope on work queue"
        );

        self.jetstream
            .publish_with_headers(
                subject.clone(),
                headers,
                Bytes::from(envelope.body.clone()),
            )
            .await
            .map_err(DomainError::Enqueue)?;

        debug!(subject = %subject, "Envelope enqueued and acknowledged");

        Ok(())
    }
}
