//! Router for the Gmail push notification API

use std::sync::{Arc, RwLock};

use axum::{Json, Router, extract::State, http::StatusCode};

use super::public::PushEnvelope;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::pipeline::{self, notification};

type SharedState = Arc<RwLock<AppState>>;

/// Handle one push delivery for a watched mailbox. A non-2xx status
/// makes the transport redeliver; malformed payloads get a 400 since
/// redelivery can never fix them.
async fn gmail_push_handler(
    State(state): State<SharedState>,
    Json(envelope): Json<PushEnvelope>,
) -> Result<StatusCode, ApiError> {
    let (db, config) = {
        let state = state.read().unwrap();
        (state.db.clone(), state.config.clone())
    };

    let notification = match notification::decode(&envelope.message.data) {
        Ok(notification) => notification,
        Err(err) => {
            tracing::warn!("Rejected push delivery: {}", err);
            return Ok(StatusCode::BAD_REQUEST);
        }
    };

    let outcome = pipeline::run_for_notification(&db, &config, &notification).await?;
    tracing::info!(
        "Processed notification for {}: {:?}",
        notification.email_address,
        outcome
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Create the notifications router
pub fn router() -> Router<SharedState> {
    Router::new().route("/gmail", axum::routing::post(gmail_push_handler))
}
