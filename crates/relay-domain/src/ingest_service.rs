use crate::error::DomainError;
use crate::event::{CommandEvent, CommandRequest};
use crate::producer::EventLogProducer;
use crate::record::{LogPayload, LogRecord};
use std::sync::Arc;
use tracing::{debug, error, info};

/// How the gateway picks the log partition for an appended record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionKeying {
    /// Every record goes to one fixed partition, giving a single totally
    /// ordered stream of commands.
    Fixed(String),
    /// Partition by the event's type, trading the global order for
    /// per-type ordering and substrate-side fan-out.
    EventType,
}

impl PartitionKeying {
    fn key_for(&self, event: &CommandEvent) -> String {
        match self {
            PartitionKeying::Fixed(key) => key.clone(),
            PartitionKeying::EventType => event.event_type.clone(),
        }
    }
}

/// Outcome of one gateway invocation.
///
/// The gateway never returns a hard fault: validation and substrate failures
/// are carried in-band so the caller can decide whether to retry or alert.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Record appended; the original event is echoed back unchanged. The
    /// log's assigned sequence is deliberately not part of the outcome.
    Accepted { event: CommandEvent },
    /// The event was accepted but the append failed; the log holds nothing.
    Degraded {
        event: CommandEvent,
        error: DomainError,
    },
    /// The event never reached the append call.
    Rejected { error: DomainError },
}

/// Gateway service: one inbound command event in, one log record out.
///
/// Flow:
/// 1. Validate the event type
/// 2. Serialize the record payload
/// 3. Append via the producer trait, exactly once
pub struct IngestService {
    log_producer: Arc<dyn EventLogProducer>,
    partitioning: PartitionKeying,
}

impl IngestService {
    pub fn new(log_producer: Arc<dyn EventLogProducer>, partitioning: PartitionKeying) -> Self {
        Self {
            log_producer,
            partitioning,
        }
    }

    pub async fn ingest(&self, request: CommandRequest) -> IngestOutcome {
        let event = request.arguments.event;

        debug!(
            field_name = %request.info.field_name,
            event_type = %event.event_type,
            field_count = event.data.len(),
            "received command event"
        );

        if event.event_type.is_empty() {
            error!("rejected command event with empty type");
            return IngestOutcome::Rejected {
                error: DomainError::EmptyEventType,
            };
        }

        let payload = LogPayload {
            event: event.event_type.clone(),
            data: event.data.clone(),
        };

        let bytes = match serde_json::to_vec(&payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %e, event_type = %event.event_type, "failed to serialize record payload");
                return IngestOutcome::Rejected {
                    error: DomainError::PayloadSerialize(e),
                };
            }
        };

        let record = LogRecord {
            partition_key: self.partitioning.key_for(&event),
            payload: bytes,
        };

        match self.log_producer.append(&record).await {
            Ok(()) => {
                info!(
                    event_type = %event.event_type,
                    partition_key = %record.partition_key,
                    "appended command event to log"
                );
                IngestOutcome::Accepted { event }
            }
            Err(error) => {
                error!(
                    error = %error,
                    event_type = %event.event_type,
                    partition_key = %record.partition_key,
                    "log append failed"
                );
                IngestOutcome::Degraded { event, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::MockEventLogProducer;

    fn request(event_type: &str, data: serde_json::Map<String, serde_json::Value>) -> CommandRequest {
        CommandRequest {
            info: crate::event::RequestInfo {
                field_name: "emitCommand".to_string(),
            },
            arguments: crate::event::RequestArguments {
                event: CommandEvent {
                    event_type: event_type.to_string(),
                    data,
                },
            },
        }
    }

    fn order_created_data() -> serde_json::Map<String, serde_json::Value> {
        let mut data = serde_json::Map::new();
        data.insert("id".to_string(), serde_json::Value::Number(7.into()));
        data
    }

    #[tokio::test]
    async fn test_ingest_success_echoes_event() {
        // Arrange
        let mut mock_producer = MockEventLogProducer::new();
        mock_producer
            .expect_append()
            .withf(|record: &LogRecord| {
                record.partition_key == "2"
                    && record.payload == br#"{"event":"order.created","data":{"id":7}}"#
            })
            .times(1)
            .return_once(|_| Ok(()));

        let service = IngestService::new(
            Arc::new(mock_producer),
            PartitionKeying::Fixed("2".to_string()),
        );

        // Act
        let outcome = service
            .ingest(request("order.created", order_created_data()))
            .await;

        // Assert
        match outcome {
            IngestOutcome::Accepted { event } => {
                assert_eq!(event.event_type, "order.created");
                assert_eq!(event.data, order_created_data());
            }
            other => panic!("expected Accepted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingest_append_failure_degrades_in_band() {
        // Arrange
        let mut mock_producer = MockEventLogProducer::new();
        mock_producer
            .expect_append()
            .times(1)
            .return_once(|_| Err(DomainError::Append(anyhow::anyhow!("stream unreachable"))));

        let service = IngestService::new(
            Arc::new(mock_producer),
            PartitionKeying::Fixed("2".to_string()),
        );

        // Act
        let outcome = service
            .ingest(request("order.created", order_created_data()))
            .await;

        // Assert: the fault is carried in-band and the event is preserved
        match outcome {
            IngestOutcome::Degraded { event, error } => {
                assert_eq!(event.event_type, "order.created");
                assert!(matches!(error, DomainError::Append(_)));
            }
            other => panic!("expected Degraded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingest_empty_type_rejected_without_append() {
        // Arrange
        let mut mock_producer = MockEventLogProducer::new();
        mock_producer.expect_append().times(0);

        let service = IngestService::new(
            Arc::new(mock_producer),
            PartitionKeying::Fixed("2".to_string()),
        );

        // Act
        let outcome = service.ingest(request("", order_created_data())).await;

        // Assert
        match outcome {
            IngestOutcome::Rejected { error } => {
                assert!(matches!(error, DomainError::EmptyEventType));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingest_partitions_by_event_type_when_configured() {
        // Arrange
        let mut mock_producer = MockEventLogProducer::new();
        mock_producer
            .expect_append()
            .withf(|record: &LogRecord| record.partition_key == "order.created")
            .times(1)
            .return_once(|_| Ok(()));

        let service = IngestService::new(Arc::new(mock_producer), PartitionKeying::EventType);

        // Act
        let outcome = service
            .ingest(request("order.created", order_created_data()))
            .await;

        // Assert
        assert!(matches!(outcome, IngestOutcome::Accepted { .. }));
    }

    #[tokio::test]
    async fn test_ingest_passes_data_through_uninterpreted() {
        // Arrange: nested, mixed-type data the gateway must not touch
        let mut nested = serde_json::Map::new();
        nested.insert("city".to_string(), serde_json::Value::String("Oslo".into()));
        let mut data = serde_json::Map::new();
        data.insert("address".to_string(), serde_json::Value::Object(nested));
        data.insert("count".to_string(), serde_json::Value::Number(3.into()));
        data.insert("flag".to_string(), serde_json::Value::Bool(true));

        let mut mock_producer = MockEventLogProducer::new();
        mock_producer
            .expect_append()
            .withf(|record: &LogRecord| {
                let payload: LogPayload = serde_json::from_slice(&record.payload).unwrap();
                payload.event == "customer.moved" && payload.data.len() == 3
            })
            .times(1)
            .return_once(|_| Ok(()));

        let service = IngestService::new(
            Arc::new(mock_producer),
            PartitionKeying::Fixed("2".to_string()),
        );

        // Act
        let outcome = service.ingest(request("customer.moved", data.clone())).await;

        // Assert
        match outcome {
            IngestOutcome::Accepted { event } => assert_eq!(event.data, data),
            other => panic!("expected Accepted, got {:?}", other),
        }
    }
}
