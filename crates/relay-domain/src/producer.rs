use crate::error::DomainResult;
use crate::record::{LogRecord, QueueEnvelope};
use async_trait::async_trait;

/// Append-side client of the event log substrate.
/// Infrastructure (relay-nats) implements this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventLogProducer: Send + Sync {
    /// Append one record to the partition named by its partition key.
    /// The append is attempted exactly once; no retry happens here.
    async fn append(&self, record: &LogRecord) -> DomainResult<()>;
}

/// Enqueue-side client of the work queue substrate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkQueueProducer: Send + Sync {
    /// Enqueue one envelope. The substrate serializes delivery per group key
    /// and suppresses duplicate dedup keys within its retention window.
    async fn enqueue(&self, envelope: &QueueEnvelope) -> DomainResult<()>;
}
