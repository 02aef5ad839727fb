pub mod error;
pub mod event;
pub mod forward_service;
pub mod ingest_service;
pub mod producer;
pub mod record;

pub use error::{DomainError, DomainResult};
pub use event::{CommandEvent, CommandRequest, RequestArguments, RequestInfo};
pub use forward_service::{DedupKeying, ForwardService};
pub use ingest_service::{IngestOutcome, IngestService, PartitionKeying};
pub use producer::{EventLogProducer, WorkQueueProducer};
pub use record::{
    DeliveryRecord, ForwardReceipt, LogDeliveryBatch, LogPayload, LogRecord, QueueEnvelope,
};
