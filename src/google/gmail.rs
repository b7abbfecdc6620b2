//! Gmail API client for resolving newly arrived messages and fetching
//! their attachments

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::pipeline::MessageStore;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

/// Message and history structures from Gmail API documentation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageRef {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    pub snippet: Option<String>,
    pub payload: Option<MessagePayload>,
    #[serde(rename = "labelIds")]
    pub label_ids: Option<Vec<String>>,
    #[serde(rename = "internalDate")]
    pub internal_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub headers: Option<Vec<MessageHeader>>,
    #[serde(rename = "mimeType")]
    pub mimetype: Option<String>,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "partId")]
    pub part_id: Option<String>,
    #[serde(rename = "mimeType")]
    pub mimetype: Option<String>,
    pub filename: Option<String>,
    pub body: Option<MessagePartBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePartBody {
    #[serde(rename = "attachmentId")]
    pub attachment_id: Option<String>,
    pub size: Option<u64>,
    // Base64url encoded
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// attachments.get response body
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentResponse {
    pub size: Option<u64>,
    // Base64url encoded
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchRequest {
    topic_name: String,
    label_ids: Vec<String>,
}

/// users.watch response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchResponse {
    pub history_id: Option<String>,
    /// Milliseconds since epoch
    pub expiration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    history: Option<Vec<HistoryRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRecord {
    #[serde(default)]
    messages_added: Vec<HistoryMessageAdded>,
}

#[derive(Debug, Deserialize)]
struct HistoryMessageAdded {
    message: MessageRef,
}

/// Gmail REST client bound to one account and one access token. Tokens
/// are minted per invocation; nothing here is process-global.
pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: String,
    user_id: String,
}

impl GmailClient {
    pub fn new(access_token: &str, user_id: &str) -> Self {
        Self::with_base_url(access_token, user_id, GMAIL_API_BASE)
    }

    /// Point the client at a different host (tests).
    pub fn with_base_url(access_token: &str, user_id: &str, base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            user_id: user_id.to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let res = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("{} failed: {} ({})", what, status, text);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Register the push watch on the account's inbox. Watches expire
    /// after about seven days and must be re-registered.
    pub async fn watch(&self, topic_name: &str) -> Result<WatchResponse> {
        let url = format!(
            "{}/gmail/v1/users/{}/watch",
            self.base_url, self.user_id
        );
        let body = WatchRequest {
            topic_name: topic_name.to_string(),
            label_ids: vec!["INBOX".to_string()],
        };
        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Watch setup failed: {} ({})", status, text);
        }
        let watch: WatchResponse = serde_json::from_str(&text)?;
        Ok(watch)
    }
}

#[async_trait]
impl MessageStore for GmailClient {
    async fn list_most_recent(&self) -> Result<Option<MessageRef>> {
        let url = format!(
            "{}/gmail/v1/users/{}/messages?maxResults=1",
            self.base_url, self.user_id
        );
        let res: ListMessagesResponse = self.get_json(&url, "Message list").await?;
        Ok(res.messages.unwrap_or_default().into_iter().next())
    }

    async fn list_history(&self, start_history_id: &str) -> Result<Vec<MessageRef>> {
        let url = format!(
            "{}/gmail/v1/users/{}/history?startHistoryId={}&historyTypes=messageAdded",
            self.base_url,
            self.user_id,
            urlencoding::encode(start_history_id)
        );
        let res: HistoryResponse = self.get_json(&url, "History list").await?;
        // An absent history array means nothing changed since the cursor
        Ok(res
            .history
            .unwrap_or_default()
            .into_iter()
            .flat_map(|record| record.messages_added)
            .map(|added| added.message)
            .collect())
    }

    async fn get_message(&self, message_id: &str) -> Result<Message> {
        let url = format!(
            "{}/gmail/v1/users/{}/messages/{}",
            self.base_url, self.user_id, message_id
        );
        self.get_json(&url, "Message fetch").await
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<AttachmentResponse> {
        let url = format!(
            "{}/gmail/v1/users/{}/messages/{}/attachments/{}",
            self.base_url, self.user_id, message_id, attachment_id
        );
        self.get_json(&url, "Attachment fetch").await
    }
}
