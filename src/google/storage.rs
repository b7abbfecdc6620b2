//! Cloud Storage client for archiving attachment bytes

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use crate::pipeline::sink::BlobStore;

const STORAGE_API_BASE: &str = "https://storage.googleapis.com";

/// Deterministic public-style URL for an uploaded object.
pub fn public_url(bucket: &str, object: &str) -> String {
    format!(
        "https://storage.googleapis.com/{}/{}",
        bucket,
        urlencoding::encode(object)
    )
}

/// Storage REST client bound to one bucket.
pub struct StorageClient {
    http: Client,
    base_url: String,
    access_token: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(access_token: &str, bucket: &str) -> Self {
        Self::with_base_url(access_token, bucket, STORAGE_API_BASE)
    }

    /// Point the client at a different host (tests).
    pub fn with_base_url(access_token: &str, bucket: &str, base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for StorageClient {
    async fn upload(&self, object: &str, data: Vec<u8>) -> Result<String> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(object)
        );
        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Object upload failed: {} ({})", status, text);
        }
        Ok(public_url(&self.bucket, object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("submissions", "m1_photo.jpg"),
            "https://storage.googleapis.com/submissions/m1_photo.jpg"
        );
    }

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload/storage/v1/b/submissions/o")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("uploadType".into(), "media".into()),
                mockito::Matcher::UrlEncoded("name".into(), "m1_photo.jpg".into()),
            ]))
            .match_body("image bytes")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "m1_photo.jpg", "bucket": "submissions"}"#)
            .create_async()
            .await;

        let client = StorageClient::with_base_url("test_token", "submissions", &server.url());
        let link = client
            .upload("m1_photo.jpg", b"image bytes".to_vec())
            .await
            .unwrap();
        assert_eq!(
            link,
            "https://storage.googleapis.com/submissions/m1_photo.jpg"
        );
    }

    #[tokio::test]
    async fn test_upload_failure_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload/storage/v1/b/submissions/o")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .expect(1)
            .create_async()
            .await;

        let client = StorageClient::with_base_url("test_token", "submissions", &server.url());
        let err = client
            .upload("m1_photo.jpg", b"image bytes".to_vec())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Object upload failed"));
        mock.assert_async().await;
    }
}
