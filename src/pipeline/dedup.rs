//! First-seen tracking for processed messages
//!
//! The push transport may deliver the same event more than once, and
//! deliveries for the same message can run concurrently. The marker
//! insert therefore happens inside an IMMEDIATE transaction so the
//! existence check and the write are atomic per message id.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::TransactionBehavior;
use tokio_rusqlite::Connection;

#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Returns true only for the first sighting of `message_id`. At most
    /// one caller across any number of concurrent attempts gets true.
    async fn first_seen(&self, message_id: &str) -> Result<bool>;
}

/// Dedup markers persisted in the `processed_message` table. Records are
/// written once and never updated; existence is the signal.
#[derive(Clone)]
pub struct SqliteDedup {
    db: Connection,
}

impl SqliteDedup {
    pub fn new(db: Connection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DedupStore for SqliteDedup {
    async fn first_seen(&self, message_id: &str) -> Result<bool> {
        let message_id = message_id.to_string();
        let first = self
            .db
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let seen: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM processed_message WHERE message_id = ?1)",
                    [&message_id],
                    |row| row.get(0),
                )?;
                if !seen {
                    tx.execute(
                        "INSERT INTO processed_message (message_id, first_seen) VALUES (?1, ?2)",
                        (&message_id, Utc::now().to_rfc3339()),
                    )?;
                }
                tx.commit()?;
                Ok(!seen)
            })
            .await?;
        Ok(first)
    }
}
