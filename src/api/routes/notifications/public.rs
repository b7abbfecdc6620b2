//! Public types for the notifications API
use serde::{Deserialize, Serialize};

/// Pub/Sub push envelope delivered to the endpoint. Only the wrapped
/// `data` payload is consumed; the rest of the envelope is transport
/// detail.
#[derive(Debug, Deserialize, Serialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    pub subscription: Option<String>,
}

/// The inner transport message; `data` is base64-wrapped JSON.
#[derive(Debug, Deserialize, Serialize)]
pub struct PushMessage {
    pub data: String,
    #[serde(rename = "messageId")]
    pub message_id: Option<String>,
}
