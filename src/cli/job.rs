use anyhow::Result;

use crate::core::{AppConfig, db::async_db};
use crate::jobs::{PeriodicJob, RenewGmailWatch};

#[derive(clap::ValueEnum, Clone)]
pub enum JobId {
    RenewGmailWatch,
}

pub async fn run(id: JobId) -> Result<()> {
    let config = AppConfig::default();
    let db = async_db(&config.storage_path).await?;

    match id {
        JobId::RenewGmailWatch => RenewGmailWatch.run_job(&config, &db).await,
    }

    Ok(())
}
