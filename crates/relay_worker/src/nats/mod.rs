mod forward_handler;
mod ingest_endpoint;

pub use forward_handler::create_forward_handler;
pub use ingest_endpoint::IngestEndpoint;
