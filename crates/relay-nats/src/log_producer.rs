use crate::traits::JetStreamPublisher;
use async_trait::async_trait;
use relay_domain::error::{DomainError, DomainResult};
use relay_domain::producer::EventLogProducer;
use relay_domain::record::LogRecord;
use std::sync::Arc;
use tracing::{debug, info};

/// NATS JetStream producer for the event log.
///
/// The partition key becomes the subject tail token, so per-subject ordering
/// in the stream is per-partition ordering in the log.
pub struct NatsEventLogProducer {
    jetstream: Arc<dyn JetStreamPublisher>,
    stream_name: String,
}

impl NatsEventLogProducer {
    pub fn new(jetstream: Arc<dyn JetStreamPublisher>, stream_name: String) -> Self {
        info!(stream = %stream_name, "Created NatsEventLogProducer");
        Self {
            jetstream,
            stream_name,
        }
    }
}

#[async_trait]
impl EventLogProducer for NatsEventLogProducer {
    async fn append(&self, record: &LogRecord) -> DomainResult<()> {
        let subject = format!("{}.{}", self.stream_name, record.partition_key);

        debug!(
            subject = %subject,
            partition_key = %record.partition_key,
            size_bytes = record.payload.len(),
            "Appending record to event log"
        );

        self.jetstream
            .publish(subject.clone(), record.payload.clone().into())
            .await
            .map_err(DomainError::Append)?;

        debug!(subject = %subject, "Record appended and acknowledged");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockJetStreamPublisher;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_append_publishes_to_partition_subject() {
        // Arrange
        let mut mock_jetstream = MockJetStreamPublisher::new();
        mock_jetstream
            .expect_publish()
            .withf(|subject: &String, payload: &Bytes| {
                subject == "command_log.2" && payload.as_ref() == br#"{"event":"x","data":{}}"#
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let producer =
            NatsEventLogProducer::new(Arc::new(mock_jetstream), "command_log".to_string());

        let record = LogRecord {
            partition_key: "2".to_string(),
            payload: br#"{"event":"x","data":{}}"#.to_vec(),
        };

        // Act
        let result = producer.append(&record).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_append_failure_maps_to_domain_error() {
        // Arrange
        let mut mock_jetstream = MockJetStreamPublisher::new();
        mock_jetstream
            .expect_publish()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("NATS publish failed")));

        let producer =
            NatsEventLogProducer::new(Arc::new(mock_jetstream), "command_log".to_string());

        let record = LogRecord {
            partition_key: "2".to_string(),
            payload: b"payload".to_vec(),
        };

        // Act
        let result = producer.append(&record).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Append(_))));
    }
}
