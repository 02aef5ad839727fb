use async_nats::jetstream::Message;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use relay_domain::record::{DeliveryRecord, LogDeliveryBatch};
use relay_domain::ForwardService;
use relay_nats::{BatchDisposition, BatchHandler};
use std::sync::Arc;
use tracing::{debug, warn};

/// Create a BatchHandler that shapes fetched log records into a delivery
/// batch and drives it through the forwarder service.
pub fn create_forward_handler(service: Arc<ForwardService>) -> BatchHandler {
    Box::new(move |messages: &[Message]| {
        let service = Arc::clone(&service);

        // Copy payloads out before the async block; Message borrows from the
        // slice. The delivery contract hands each record over as the base64
        // encoding of its payload, in fetch order.
        let batch = LogDeliveryBatch {
            records: messages
                .iter()
                .map(|msg| DeliveryRecord {
                    data: BASE64.encode(&msg.payload),
                })
                .collect(),
        };

        Box::pin(async move {
            match service.forward(batch).await {
                Ok(receipt) => {
                    debug!(
                        forwarded = receipt.forwarded,
                        dedup_key = %receipt.dedup_key,
                        "forwarded delivery batch to work queue"
                    );
                    BatchDisposition::Commit
                }
                Err(e) => {
                    warn!(error = %e, "forward failed, requesting batch redelivery");
                    BatchDisposition::Redeliver {
                        reason: e.to_string(),
                    }
                }
            }
        })
    })
}

// Note: exercising the handler needs actual NATS Message objects, which
// cannot be built without a live connection. The decode-and-forward path it
// wraps is covered by the ForwardService tests and the relay-domain
// integration tests.
