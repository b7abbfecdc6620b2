use async_trait::async_trait;
use std::time::Duration;
use tokio_rusqlite::Connection;

use super::PeriodicJob;
use crate::core::AppConfig;
use crate::google::gmail::GmailClient;
use crate::google::oauth::{find_all_gmail_auth_emails, find_refresh_token, refresh_access_token};

/// Re-registers the Gmail push watch for every authorized account.
/// Watches expire after about seven days; renewing daily keeps a wide
/// margin.
#[derive(Default, Debug)]
pub struct RenewGmailWatch;

#[async_trait]
impl PeriodicJob for RenewGmailWatch {
    fn interval(&self) -> Duration {
        Duration::from_secs(60 * 60 * 24)
    }

    async fn run_job(&self, config: &AppConfig, db: &Connection) {
        let topic_name = format!(
            "projects/{}/topics/{}",
            config.gcp_project_id, config.pubsub_topic
        );
        let emails = match find_all_gmail_auth_emails(db).await {
            Ok(emails) => emails,
            Err(err) => {
                tracing::error!("Watch renewal query failed: {}", err);
                return;
            }
        };
        for email in emails {
            match renew_for_account(config, db, &email, &topic_name).await {
                Ok(expiration) => {
                    tracing::info!("Watch renewed for {} (expires {})", email, expiration)
                }
                Err(err) => tracing::error!("Watch renewal failed for {}: {}", email, err),
            }
        }
    }
}

async fn renew_for_account(
    config: &AppConfig,
    db: &Connection,
    email: &str,
    topic_name: &str,
) -> anyhow::Result<String> {
    let refresh_token = find_refresh_token(db, email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no stored refresh token"))?;
    let token = refresh_access_token(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &refresh_token,
    )
    .await?;
    let client = GmailClient::new(&token.access_token, email);
    let response = client.watch(topic_name).await?;
    Ok(response.expiration.unwrap_or_default())
}
