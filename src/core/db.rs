//! Sqlite storage for account credentials and processed-message markers

use std::path::Path;

use anyhow::Result;
use rusqlite::Connection as SyncConnection;
use tokio_rusqlite::Connection;

/// Open the database inside the storage directory, creating the file if
/// it doesn't exist yet.
pub async fn async_db(storage_path: &str) -> Result<Connection> {
    let db_path = Path::new(storage_path).join("mailtag.db3");
    let db = Connection::open(db_path).await?;
    Ok(db)
}

/// Create the schema. Safe to call repeatedly.
pub fn initialize_db(conn: &SyncConnection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS auth (
             id TEXT PRIMARY KEY,
             service TEXT NOT NULL,
             refresh_token TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS processed_message (
             message_id TEXT PRIMARY KEY,
             first_seen TEXT NOT NULL
         );",
    )?;
    Ok(())
}
