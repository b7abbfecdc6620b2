use anyhow::Result;
use std::fs;

use crate::core::db::{async_db, initialize_db};

pub async fn run(storage_path: &str) -> Result<()> {
    fs::create_dir_all(storage_path)?;
    let db = async_db(storage_path).await?;
    db.call(|conn| Ok(initialize_db(conn)?)).await?;
    println!("Database initialized in {}", storage_path);
    Ok(())
}
