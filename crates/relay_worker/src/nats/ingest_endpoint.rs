use anyhow::{Context, Result};
use futures::StreamExt;
use relay_domain::{CommandRequest, IngestOutcome, IngestService};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Thin request/reply surface in front of the ingestion gateway.
///
/// Callers publish a `CommandRequest` as JSON on the ingest subject. When a
/// reply inbox is present, the response mirrors the gateway's wire contract:
/// `{"type", "data"}` on accept, `{"error"}` on rejection or degradation.
/// Payload schema validation stays a caller responsibility.
pub struct IngestEndpoint {
    client: async_nats::Client,
    subject: String,
    service: Arc<IngestService>,
}

impl IngestEndpoint {
    pub fn new(client: async_nats::Client, subject: String, service: Arc<IngestService>) -> Self {
        Self {
            client,
            subject,
            service,
        }
    }

    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        let mut requests = self
            .client
            .subscribe(self.subject.clone())
            .await
            .context("Failed to subscribe to ingest subject")?;

        info!(subject = %self.subject, "Ingest endpoint listening");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("Received shutdown signal, stopping ingest endpoint");
                    break;
                }
                maybe_request = requests.next() => {
                    let Some(request) = maybe_request else {
                        warn!("Ingest subscription closed");
                        break;
                    };

                    let response = self.handle(request.payload.as_ref()).await;

                    if let Some(reply) = request.reply {
                        if let Err(e) = self.client.publish(reply, response.into()).await {
                            error!(error = %e, "Failed to publish ingest reply");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle(&self, payload: &[u8]) -> String {
        let request: CommandRequest = match serde_json::from_slice(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Malformed command request");
                return serde_json::json!({
                    "error": format!("malformed command request: {}", e),
                })
                .to_string();
            }
        };

        wire_response(self.service.ingest(request).await)
    }
}

/// Serialize an outcome into the response shape callers expect.
fn wire_response(outcome: IngestOutcome) -> String {
    let value = match outcome {
        IngestOutcome::Accepted { event } => serde_json::json!({
            "type": event.event_type,
            "data": event.data,
        }),
        IngestOutcome::Degraded { error, .. } | IngestOutcome::Rejected { error } => {
            serde_json::json!({ "error": error.to_string() })
        }
    };
    value.to_string()
}
