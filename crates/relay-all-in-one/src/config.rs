use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Stream name of the command event log
    #[serde(default = "default_log_stream")]
    pub log_stream: String,

    /// Stream name of the task work queue
    #[serde(default = "default_queue_stream")]
    pub queue_stream: String,

    /// Delivery group all forwarded envelopes share
    #[serde(default = "default_queue_group")]
    pub queue_group: String,

    /// Subject the ingest endpoint answers on
    #[serde(default = "default_ingest_subject")]
    pub ingest_subject: String,

    /// Fixed log partition for appended records
    #[serde(default = "default_partition_key")]
    pub partition_key: String,

    /// Partition by event type instead of the fixed key
    #[serde(default)]
    pub partition_by_event_type: bool,

    /// Use wall-clock dedup keys instead of content hashes
    #[serde(default)]
    pub dedup_by_timestamp: bool,

    /// Batch size for the delivery consumer
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Max wait time for delivery batches in seconds
    #[serde(default = "default_batch_wait_secs")]
    pub batch_wait_secs: u64,

    /// Duplicate suppression window on the work queue in seconds
    #[serde(default = "default_queue_duplicate_window_secs")]
    pub queue_duplicate_window_secs: u64,

    /// Connection timeout for the NATS client in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_log_stream() -> String {
    "command_log".to_string()
}

fn default_queue_stream() -> String {
    "task_queue".to_string()
}

fn default_queue_group() -> String {
    "task-process".to_string()
}

fn default_ingest_subject() -> String {
    "ingest.command".to_string()
}

fn default_partition_key() -> String {
    "2".to_string()
}

fn default_batch_size() -> usize {
    30
}

fn default_batch_wait_secs() -> u64 {
    5
}

fn default_queue_duplicate_window_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("RELAY"))
            .build()?
            .try_deserialize()
    }
}
