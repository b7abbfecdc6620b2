use std::env;

use crate::pipeline::resolver::ResolvePolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub gmail_api_client_id: String,
    pub gmail_api_client_secret: String,
    pub gcp_project_id: String,
    pub pubsub_topic: String,
    pub sheet_id: String,
    pub sheet_range: String,
    pub subject_tag: Option<String>,
    pub bucket: Option<String>,
    pub resolve_policy: ResolvePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("MAILTAG_STORAGE_PATH").unwrap_or("./".to_string());
        let gmail_api_client_id =
            env::var("MAILTAG_GMAIL_CLIENT_ID").expect("Missing MAILTAG_GMAIL_CLIENT_ID");
        let gmail_api_client_secret =
            env::var("MAILTAG_GMAIL_CLIENT_SECRET").expect("Missing MAILTAG_GMAIL_CLIENT_SECRET");
        let gcp_project_id =
            env::var("MAILTAG_GCP_PROJECT").expect("Missing env var MAILTAG_GCP_PROJECT");
        let pubsub_topic =
            env::var("MAILTAG_PUBSUB_TOPIC").expect("Missing env var MAILTAG_PUBSUB_TOPIC");
        let sheet_id = env::var("MAILTAG_SHEET_ID").expect("Missing env var MAILTAG_SHEET_ID");
        let sheet_range =
            env::var("MAILTAG_SHEET_RANGE").unwrap_or_else(|_| "Sheet1!A1:F1".to_string());
        let subject_tag = env::var("MAILTAG_SUBJECT_TAG").ok();
        let bucket = env::var("MAILTAG_BUCKET").ok();
        let resolve_policy = env::var("MAILTAG_RESOLVE_POLICY")
            .ok()
            .map(|raw| {
                raw.parse()
                    .expect("MAILTAG_RESOLVE_POLICY must be one of: most-recent, history-tag, history-tag-all")
            })
            .unwrap_or(ResolvePolicy::MostRecent);

        Self {
            storage_path,
            gmail_api_client_id,
            gmail_api_client_secret,
            gcp_project_id,
            pubsub_topic,
            sheet_id,
            sheet_range,
            subject_tag,
            bucket,
            resolve_policy,
        }
    }
}
