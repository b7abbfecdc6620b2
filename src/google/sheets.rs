//! Google Sheets client for appending result rows

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::pipeline::sink::RowSink;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Sheets REST client bound to one spreadsheet and one fixed range.
pub struct SheetsClient {
    http: Client,
    base_url: String,
    access_token: String,
    spreadsheet_id: String,
    range: String,
}

impl SheetsClient {
    pub fn new(access_token: &str, spreadsheet_id: &str, range: &str) -> Self {
        Self::with_base_url(access_token, spreadsheet_id, range, SHEETS_API_BASE)
    }

    /// Point the client at a different host (tests).
    pub fn with_base_url(
        access_token: &str,
        spreadsheet_id: &str,
        range: &str,
        base_url: &str,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
        }
    }
}

#[async_trait]
impl RowSink for SheetsClient {
    async fn append_row(&self, row: &[String]) -> Result<()> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(&self.range)
        );
        let body = json!({
            "range": self.range,
            "majorDimension": "ROWS",
            "values": [row],
        });
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
            anyhow::bail!("Sheet append failed: {} ({})", status, text);
        }
        Ok(())
    }
}
