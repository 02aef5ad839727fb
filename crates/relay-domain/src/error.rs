use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("event type must be a non-empty identifier")]
    EmptyEventType,

    #[error("failed to serialize record payload: {0}")]
    PayloadSerialize(serde_json::Error),

    #[error("log append failed: {0}")]
    Append(anyhow::Error),

    #[error("delivery batch is empty")]
    EmptyBatch,

    #[error("failed to decode delivery record {index}: {reason}")]
    RecordDecode { index: usize, reason: String },

    #[error("failed to serialize envelope body: {0}")]
    BodySerialize(serde_json::Error),

    #[error("queue enqueue failed: {0}")]
    Enqueue(anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
