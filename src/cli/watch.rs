use anyhow::{Result, anyhow};

use crate::core::{AppConfig, db::async_db};
use crate::google::gmail::GmailClient;
use crate::google::oauth::{find_refresh_token, refresh_access_token};

pub async fn run(email: &str, storage_path: &str) -> Result<()> {
    let config = AppConfig::default();
    let db = async_db(storage_path).await?;

    let refresh_token = find_refresh_token(&db, email).await?.ok_or_else(|| {
        anyhow!(
            "No stored refresh token for {}. Run `mailtag auth --service gmail` first.",
            email
        )
    })?;
    let token = refresh_access_token(
        &config.gmail_api_client_id,
        &config.gmail_api_client_secret,
        &refresh_token,
    )
    .await?;

    let topic_name = format!(
        "projects/{}/topics/{}",
        config.gcp_project_id, config.pubsub_topic
    );
    let client = GmailClient::new(&token.access_token, email);
    let response = client.watch(&topic_name).await?;
    println!(
        "Watch registered for {} (expires {})",
        email,
        response.expiration.unwrap_or_default()
    );

    Ok(())
}
