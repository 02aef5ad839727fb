mod client;
mod consumer;
mod log_producer;
mod queue_producer;
mod traits;

pub use client::{NatsClient, NatsJetStreamConsumer, NatsJetStreamPublisher, NatsPullConsumer};
pub use consumer::{BatchDisposition, BatchHandler, DeliveryConsumer};
pub use log_producer::NatsEventLogProducer;
pub use queue_producer::NatsWorkQueueProducer;
pub use traits::{JetStreamConsumer, JetStreamPublisher, PullConsumer};

#[cfg(any(test, feature = "testing"))]
pub use traits::{MockJetStreamConsumer, MockJetStreamPublisher, MockPullConsumer};
