use serde::{Deserialize, Serialize};

/// One inbound domain event. `data` is an arbitrary key/value mapping and is
/// passed through the relay uninterpreted; payload schema validation is the
/// caller's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// The invocation shape handed to the gateway by its caller.
///
/// `info.field_name` identifies the resolver field that produced the call;
/// it is logged but never used for routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub info: RequestInfo,
    pub arguments: RequestArguments,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestInfo {
    #[serde(rename = "fieldName")]
    pub field_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestArguments {
    pub event: CommandEvent,
}
