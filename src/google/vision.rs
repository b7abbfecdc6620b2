//! Cloud Vision API client for image label detection

use anyhow::Result;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::pipeline::classify::LabelDetector;

const VISION_API_BASE: &str = "https://vision.googleapis.com";

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    responses: Option<Vec<AnnotateImageResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    label_annotations: Option<Vec<LabelAnnotation>>,
    error: Option<AnnotateError>,
}

#[derive(Debug, Deserialize)]
struct LabelAnnotation {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnnotateError {
    message: Option<String>,
}

pub struct VisionClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl VisionClient {
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, VISION_API_BASE)
    }

    /// Point the client at a different host (tests).
    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }
}

#[async_trait]
impl LabelDetector for VisionClient {
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<String>> {
        let url = format!("{}/v1/images:annotate", self.base_url);
        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": "LABEL_DETECTION" }]
            }]
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
            anyhow::bail!("Label detection failed: {} ({})", status, text);
        }
        let annotate: AnnotateResponse = serde_json::from_str(&text)?;
        let first = annotate
            .responses
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Label detection returned no responses"))?;
        if let Some(error) = first.error {
            anyhow::bail!(
                "Label detection rejected the image: {}",
                error.message.unwrap_or_default()
            );
        }
        // Annotations arrive in the service's confidence order
        Ok(first
            .label_annotations
            .unwrap_or_default()
            .into_iter()
            .filter_map(|annotation| annotation.description)
            .collect())
    }
}
