//! Periodic background jobs

pub mod renew_watch;

pub use renew_watch::RenewGmailWatch;

use std::time::Duration;

use async_trait::async_trait;
use tokio_rusqlite::Connection;

use crate::core::AppConfig;

/// A job that runs forever on a fixed interval in its own tokio task.
/// Failures are logged inside the job; the loop never stops.
#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn interval(&self) -> Duration;

    async fn run_job(&self, config: &AppConfig, db: &Connection);
}

pub fn spawn_periodic_job<J: PeriodicJob>(config: AppConfig, db: Connection, job: J) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(job.interval());
        loop {
            ticker.tick().await;
            job.run_job(&config, &db).await;
        }
    });
}
