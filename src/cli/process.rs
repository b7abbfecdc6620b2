use anyhow::{Result, bail};

use crate::core::{AppConfig, db::async_db};
use crate::pipeline::{self, notification::Notification, resolver::ResolvePolicy};

pub async fn run(email: &str, history_id: Option<String>, storage_path: &str) -> Result<()> {
    let config = AppConfig::default();
    let history_id = match history_id {
        Some(id) => id,
        None if config.resolve_policy == ResolvePolicy::MostRecent => String::new(),
        None => bail!(
            "--history-id is required for the {:?} policy",
            config.resolve_policy
        ),
    };

    let db = async_db(storage_path).await?;
    let notification = Notification {
        email_address: email.to_string(),
        history_id,
    };
    let outcome = pipeline::run_for_notification(&db, &config, &notification).await?;
    println!("{:?}", outcome);

    Ok(())
}
