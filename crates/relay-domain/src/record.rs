use serde::{Deserialize, Serialize};

/// The serialized form embedded in every log record: the event type under
/// the `event` key, the untouched caller data under `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPayload {
    pub event: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// One record bound for the event log. Exactly one record per command event;
/// ownership passes to the log substrate on a successful append.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub partition_key: String,
    pub payload: Vec<u8>,
}

/// One record as handed over by the log's delivery mechanism: the base64
/// transport encoding of the original record payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub data: String,
}

/// An ordered batch of delivery records, scoped to a single forwarder
/// invocation. Batch size and triggering are the delivery mechanism's call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogDeliveryBatch {
    pub records: Vec<DeliveryRecord>,
}

impl LogDeliveryBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One message bound for the work queue: the JSON-serialized list of decoded
/// record payloads, one envelope per delivery batch.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEnvelope {
    pub body: String,
    pub group_key: String,
    pub dedup_key: String,
}

/// What a completed forward invocation reports back to the delivery adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardReceipt {
    pub forwarded: usize,
    pub dedup_key: String,
}
