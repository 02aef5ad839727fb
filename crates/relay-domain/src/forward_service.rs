use crate::error::{DomainError, DomainResult};
use crate::producer::WorkQueueProducer;
use crate::record::{ForwardReceipt, LogDeliveryBatch, QueueEnvelope};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};

/// How the forwarder derives the dedup key for an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupKeying {
    /// Hex SHA-256 of the envelope body. Re-delivery of identical batch
    /// content collapses inside the queue's duplicate window.
    ContentHash,
    /// Milliseconds since the Unix epoch at invocation time. Two
    /// invocations within one millisecond may collide, and identical
    /// content re-delivered later is not suppressed.
    Timestamp,
}

impl DedupKeying {
    fn key_for(&self, body: &str) -> String {
        match self {
            DedupKeying::ContentHash => {
                format!("{:x}", Sha256::digest(body.as_bytes()))
            }
            DedupKeying::Timestamp => chrono::Utc::now().timestamp_millis().to_string(),
        }
    }
}

/// Forwarder service: one delivery batch in, one queue envelope out.
///
/// Flow:
/// 1. Decode every record in order (base64 → UTF-8 text)
/// 2. Serialize the ordered list as a single JSON array body
/// 3. Enqueue via the producer trait, exactly once
///
/// A decode failure on any record fails the whole invocation; the delivery
/// adapter leaves the batch unacknowledged so the log substrate redelivers
/// it as a unit.
pub struct ForwardService {
    queue_producer: Arc<dyn WorkQueueProducer>,
    group_key: String,
    dedup: DedupKeying,
}

impl ForwardService {
    pub fn new(
        queue_producer: Arc<dyn WorkQueueProducer>,
        group_key: String,
        dedup: DedupKeying,
    ) -> Self {
        Self {
            queue_producer,
            group_key,
            dedup,
        }
    }

    pub async fn forward(&self, batch: LogDeliveryBatch) -> DomainResult<ForwardReceipt> {
        if batch.is_empty() {
            return Err(DomainError::EmptyBatch);
        }

        debug!(record_count = batch.len(), "decoding delivery batch");

        // The forwarder forwards serialized text; record payloads are never
        // re-parsed into structured form.
        let mut messages = Vec::with_capacity(batch.len());
        for (index, record) in batch.records.iter().enumerate() {
            let bytes =
                BASE64
                    .decode(record.data.as_bytes())
                    .map_err(|e| DomainError::RecordDecode {
                        index,
                        reason: e.to_string(),
                    })?;
            let message = String::from_utf8(bytes).map_err(|e| DomainError::RecordDecode {
                index,
                reason: e.to_string(),
            })?;
            messages.push(message);
        }

        let body = serde_json::to_string(&messages).map_err(DomainError::BodySerialize)?;
        let dedup_key = self.dedup.key_for(&body);

        let envelope = QueueEnvelope {
            body,
            group_key: self.group_key.clone(),
            dedup_key,
        };

        self.queue_producer.enqueue(&envelope).await?;

        info!(
            forwarded = messages.len(),
            group_key = %envelope.group_key,
            dedup_key = %envelope.dedup_key,
            "forwarded delivery batch to work queue"
        );

        Ok(ForwardReceipt {
            forwarded: messages.len(),
            dedup_key: envelope.dedup_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::MockWorkQueueProducer;
    use crate::record::DeliveryRecord;

    fn encoded(text: &str) -> DeliveryRecord {
        DeliveryRecord {
            data: BASE64.encode(text.as_bytes()),
        }
    }

    #[tokio::test]
    async fn test_forward_batch_of_two_enqueues_single_envelope() {
        // Arrange
        let mut mock_producer = MockWorkQueueProducer::new();
        mock_producer
            .expect_enqueue()
            .withf(|envelope: &QueueEnvelope| {
                envelope.body == r#"["A","B"]"# && envelope.group_key == "task-process"
            })
            .times(1)
            .return_once(|_| Ok(()));

        let service = ForwardService::new(
            Arc::new(mock_producer),
            "task-process".to_string(),
            DedupKeying::ContentHash,
        );

        let batch = LogDeliveryBatch {
            records: vec![encoded("A"), encoded("B")],
        };

        // Act
        let receipt = service.forward(batch).await.unwrap();

        // Assert
        assert_eq!(receipt.forwarded, 2);
    }

    #[tokio::test]
    async fn test_forward_preserves_input_order() {
        // Arrange
        let mut mock_producer = MockWorkQueueProducer::new();
        mock_producer
            .expect_enqueue()
            .withf(|envelope: &QueueEnvelope| {
                let messages: Vec<String> = serde_json::from_str(&envelope.body).unwrap();
                messages == ["first", "second", "third"]
            })
            .times(1)
            .return_once(|_| Ok(()));

        let service = ForwardService::new(
            Arc::new(mock_producer),
            "task-process".to_string(),
            DedupKeying::ContentHash,
        );

        let batch = LogDeliveryBatch {
            records: vec![encoded("first"), encoded("second"), encoded("third")],
        };

        // Act
        let receipt = service.forward(batch).await.unwrap();

        // Assert
        assert_eq!(receipt.forwarded, 3);
    }

    #[tokio::test]
    async fn test_forward_round_trips_record_payload_text() {
        // A record whose original payload was serialized JSON must reappear
        // as exactly that string, one element of the body array.
        let original = r#"{"event":"X","data":{"a":1}}"#;

        let mut mock_producer = MockWorkQueueProducer::new();
        mock_producer
            .expect_enqueue()
            .withf(move |envelope: &QueueEnvelope| {
                let messages: Vec<String> = serde_json::from_str(&envelope.body).unwrap();
                messages.len() == 1 && messages[0] == r#"{"event":"X","data":{"a":1}}"#
            })
            .times(1)
            .return_once(|_| Ok(()));

        let service = ForwardService::new(
            Arc::new(mock_producer),
            "task-process".to_string(),
            DedupKeying::ContentHash,
        );

        let batch = LogDeliveryBatch {
            records: vec![encoded(original)],
        };

        let receipt = service.forward(batch).await.unwrap();
        assert_eq!(receipt.forwarded, 1);
    }

    #[tokio::test]
    async fn test_forward_rejects_empty_batch_without_enqueue() {
        // Arrange
        let mut mock_producer = MockWorkQueueProducer::new();
        mock_producer.expect_enqueue().times(0);

        let service = ForwardService::new(
            Arc::new(mock_producer),
            "task-process".to_string(),
            DedupKeying::ContentHash,
        );

        // Act
        let result = service.forward(LogDeliveryBatch { records: vec![] }).await;

        // Assert
        assert!(matches!(result, Err(DomainError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_forward_decode_failure_fails_whole_batch() {
        // Arrange: second record is not valid base64; no per-record isolation
        let mut mock_producer = MockWorkQueueProducer::new();
        mock_producer.expect_enqueue().times(0);

        let service = ForwardService::new(
            Arc::new(mock_producer),
            "task-process".to_string(),
            DedupKeying::ContentHash,
        );

        let batch = LogDeliveryBatch {
            records: vec![
                encoded("A"),
                DeliveryRecord {
                    data: "%%not-base64%%".to_string(),
                },
            ],
        };

        // Act
        let result = service.forward(batch).await;

        // Assert
        match result {
            Err(DomainError::RecordDecode { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected RecordDecode, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forward_enqueue_failure_is_surfaced() {
        // Arrange
        let mut mock_producer = MockWorkQueueProducer::new();
        mock_producer
            .expect_enqueue()
            .times(1)
            .return_once(|_| Err(DomainError::Enqueue(anyhow::anyhow!("queue unreachable"))));

        let service = ForwardService::new(
            Arc::new(mock_producer),
            "task-process".to_string(),
            DedupKeying::ContentHash,
        );

        let batch = LogDeliveryBatch {
            records: vec![encoded("A")],
        };

        // Act
        let result = service.forward(batch).await;

        // Assert: the adapter sees the failure and can nak the batch
        assert!(matches!(result, Err(DomainError::Enqueue(_))));
    }

    #[tokio::test]
    async fn test_content_hash_dedup_key_is_stable_per_content() {
        // Identical batch content must produce the identical dedup key so
        // the queue's duplicate window can suppress redeliveries.
        let expected = format!("{:x}", Sha256::digest(br#"["A","B"]"#));

        for _ in 0..2 {
            let expected_in_envelope = expected.clone();
            let mut mock_producer = MockWorkQueueProducer::new();
            mock_producer
                .expect_enqueue()
                .withf(move |envelope: &QueueEnvelope| envelope.dedup_key == expected_in_envelope)
                .times(1)
                .return_once(|_| Ok(()));

            let service = ForwardService::new(
                Arc::new(mock_producer),
                "task-process".to_string(),
                DedupKeying::ContentHash,
            );

            let batch = LogDeliveryBatch {
                records: vec![encoded("A"), encoded("B")],
            };

            let receipt = service.forward(batch).await.unwrap();
            assert_eq!(receipt.dedup_key, expected);
        }
    }

    #[tokio::test]
    async fn test_content_hash_dedup_key_differs_for_distinct_content() {
        let key_a = DedupKeying::ContentHash.key_for(r#"["A"]"#);
        let key_b = DedupKeying::ContentHash.key_for(r#"["B"]"#);
        assert_ne!(key_a, key_b);
        assert_eq!(key_a.len(), 64);
    }

    #[tokio::test]
    async fn test_timestamp_dedup_key_tracks_invocation_time() {
        // The legacy scheme: a wall-clock millisecond string, insensitive to
        // the envelope content.
        let before = chrono::Utc::now().timestamp_millis();
        let key = DedupKeying::Timestamp.key_for(r#"["A"]"#);
        let after = chrono::Utc::now().timestamp_millis();

        let millis: i64 = key.parse().unwrap();
        assert!(millis >= before && millis <= after);
    }
}
