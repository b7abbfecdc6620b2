//! The notification-to-record pipeline
//!
//! Control flow is strictly sequential, one notification per
//! invocation: decode, resolve, extract, fetch, classify (or archive),
//! record. External services are reached through the trait seams so
//! tests can substitute fakes for all of them.

pub mod classify;
pub mod dedup;
pub mod extract;
pub mod notification;
pub mod resolver;
pub mod sink;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use thiserror::Error;
use tokio_rusqlite::Connection;

use crate::core::AppConfig;
use crate::google::gmail::{AttachmentResponse, GmailClient, Message, MessageRef};
use crate::google::oauth::{find_refresh_token, refresh_access_token};
use crate::google::sheets::SheetsClient;
use crate::google::storage::StorageClient;
use crate::google::vision::VisionClient;
use classify::{LabelDetector, classify_attachment};
use dedup::{DedupStore, SqliteDedup};
use extract::extract_message_info;
use notification::Notification;
use resolver::{ResolvePolicy, Resolution, resolve};
use sink::{BlobStore, RowSink, build_row, object_name};

/// Failure taxonomy for one invocation. There is no local recovery:
/// every error is logged and surfaced to the transport, which owns
/// redelivery.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed notification: {0}")]
    MalformedNotification(String),
    #[error("authorization failed for {email}: {source}")]
    Auth {
        email: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("upstream call failed: {0}")]
    Upstream(#[from] anyhow::Error),
}

/// How an invocation ended. The absent outcomes short-circuit the
/// pipeline successfully; only errors surface to the transport.
#[derive(Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    Recorded { message_id: String },
    Duplicate { message_id: String },
    NoMessage,
    NoAttachment { message_id: String },
}

/// Read access to the message store, scoped to one account and one
/// per-invocation access token.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn list_most_recent(&self) -> Result<Option<MessageRef>>;
    async fn list_history(&self, start_history_id: &str) -> Result<Vec<MessageRef>>;
    async fn get_message(&self, message_id: &str) -> Result<Message>;
    /// Base64url attachment content, passed through from the store.
    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<AttachmentResponse>;
}

pub struct Pipeline {
    store: Arc<dyn MessageStore>,
    dedup: Arc<dyn DedupStore>,
    labeler: Arc<dyn LabelDetector>,
    rows: Arc<dyn RowSink>,
    /// When set, attachments are archived and the row records the link
    /// instead of labels.
    blobs: Option<Arc<dyn BlobStore>>,
    policy: ResolvePolicy,
    subject_tag: Option<String>,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn MessageStore>,
        dedup: Arc<dyn DedupStore>,
        labeler: Arc<dyn LabelDetector>,
        rows: Arc<dyn RowSink>,
        blobs: Option<Arc<dyn BlobStore>>,
        policy: ResolvePolicy,
        subject_tag: Option<String>,
    ) -> Self {
        Self {
            store,
            dedup,
            labeler,
            rows,
            blobs,
            policy,
            subject_tag,
        }
    }

    pub async fn run(
        &self,
        notification: &Notification,
    ) -> Result<PipelineOutcome, PipelineError> {
        let resolution = resolve(
            self.store.as_ref(),
            self.dedup.as_ref(),
            self.policy,
            self.subject_tag.as_deref(),
            &notification.history_id,
        )
        .await?;
        let message = match resolution {
            Resolution::Selected(message) => message,
            Resolution::Duplicate(message_id) => {
                tracing::info!("Skipping duplicate delivery for message {}", message_id);
                return Ok(PipelineOutcome::Duplicate { message_id });
            }
            Resolution::None => {
                tracing::info!(
                    "No matching message for notification from {}",
                    notification.email_address
                );
                return Ok(PipelineOutcome::NoMessage);
            }
        };

        let info = extract_message_info(&message);
        if !info.has_attachment() {
            tracing::info!("Message {} has no attachment", info.message_id);
            return Ok(PipelineOutcome::NoAttachment {
                message_id: info.message_id,
            });
        }
        // has_attachment guarantees both fields
        let filename = info.attachment_filename.clone().unwrap_or_default();
        let attachment_id = info.attachment_id.clone().unwrap_or_default();

        let attachment = self
            .store
            .get_attachment(&info.message_id, &attachment_id)
            .await?;
        let data = attachment
            .data
            .ok_or_else(|| anyhow::anyhow!("Attachment {} returned no data", attachment_id))?;
        let bytes = URL_SAFE.decode(&data).map_err(|err| {
            anyhow::anyhow!("Attachment {} is not valid base64: {}", attachment_id, err)
        })?;

        let from = info.from.clone().unwrap_or_default();
        let row = match &self.blobs {
            None => {
                let labels = classify_attachment(self.labeler.as_ref(), &filename, &bytes).await?;
                build_row(&from, &filename, &labels)
            }
            Some(blobs) => {
                let object = object_name(&info.message_id, &filename);
                let link = blobs.upload(&object, bytes).await?;
                build_row(&from, &filename, std::slice::from_ref(&link))
            }
        };
        self.rows.append_row(&row).await?;

        tracing::info!(
            "Recorded attachment {} from message {}",
            filename,
            info.message_id
        );
        Ok(PipelineOutcome::Recorded {
            message_id: info.message_id,
        })
    }
}

/// Look up credentials for the notification's account, construct the
/// production clients, and run the pipeline once. The access token is
/// minted here and passed explicitly to every client; nothing is
/// process-global.
pub async fn run_for_notification(
    db: &Connection,
    config: &AppConfig,
    notification: &Notification,
) -> Result<PipelineOutcome, PipelineError> {
    let email = notification.email_address.clone();

    let refresh_token = find_refresh_token(db, &email)
        .await
        .map_err(|source| PipelineError::Auth {
            email: email.clone(),
            source,
        })?
        .ok_or_else(|| PipelineError::Auth {
            email: email.clone(),
            source: anyhow::anyhow!("no stored refresh token"),
        })?;
    let token = refresh_access_token(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &refresh_token,
    )
    .await
    .map_err(|source| PipelineError::Auth {
        email: email.clone(),
        source,
    })?;
    let access_token = token.access_token;

    let store = Arc::new(GmailClient::new(&access_token, &email));
    let labeler = Arc::new(VisionClient::new(&access_token));
    let rows = Arc::new(SheetsClient::new(
        &access_token,
        &config.sheet_id,
        &config.sheet_range,
    ));
    let blobs = config
        .bucket
        .as_ref()
        .map(|bucket| Arc::new(StorageClient::new(&access_token, bucket)) as Arc<dyn BlobStore>);
    let dedup = Arc::new(SqliteDedup::new(db.clone()));

    Pipeline::new(
        store,
        dedup,
        labeler,
        rows,
        blobs,
        config.resolve_policy,
        config.subject_tag.clone(),
    )
    .run(notification)
    .await
}
