//! Decoding of inbound Gmail push notifications

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize};

use super::PipelineError;

/// A decoded push notification: the account whose mailbox changed and
/// the history cursor marking the change. One per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub email_address: String,
    #[serde(deserialize_with = "history_id_string")]
    pub history_id: String,
}

/// Gmail publishes `historyId` as a JSON number but relays sometimes
/// re-encode it as a string. Accept both, normalize to string.
fn history_id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

/// Decode the base64-wrapped JSON payload of a push delivery. Anything
/// that doesn't parse into a complete notification is rejected here
/// rather than crashing on field access later.
pub fn decode(data: &str) -> Result<Notification, PipelineError> {
    let bytes = STANDARD.decode(data).map_err(|err| {
        PipelineError::MalformedNotification(format!("payload is not valid base64: {}", err))
    })?;
    let notification: Notification = serde_json::from_slice(&bytes).map_err(|err| {
        PipelineError::MalformedNotification(format!("payload is not a notification: {}", err))
    })?;
    if notification.email_address.is_empty() {
        return Err(PipelineError::MalformedNotification(
            "emailAddress is empty".to_string(),
        ));
    }
    Ok(notification)
}
