//! Test utilities for integration tests
use std::env;
use std::fs;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use axum::Router;

use mailtag::api::AppState;
use mailtag::api::app;
use mailtag::core::AppConfig;
use mailtag::core::db::{async_db, initialize_db};
use mailtag::pipeline::resolver::ResolvePolicy;

/// Creates a test application router with a temporary database.
///
/// The directory name is a timestamp to avoid collisions between test
/// runs; add `#[serial]` to tests using this fixture so they don't
/// race on the filesystem.
pub async fn test_app() -> Router {
    let temp_dir = env::temp_dir();
    let ts = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        .to_string();
    let dir = temp_dir.join(ts);
    fs::create_dir_all(&dir).expect("Failed to create base directory");

    let db = async_db(dir.to_str().unwrap())
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let app_config = AppConfig {
        storage_path: dir.display().to_string(),
        gmail_api_client_id: String::from("test_client_id"),
        gmail_api_client_secret: String::from("test_client_secret"),
        gcp_project_id: String::from("test-project"),
        pubsub_topic: String::from("new-mail"),
        sheet_id: String::from("test-sheet-id"),
        sheet_range: String::from("Sheet1!A1:F1"),
        subject_tag: None,
        bucket: None,
        resolve_policy: ResolvePolicy::MostRecent,
    };
    let app_state = AppState::new(db, app_config);
    app(Arc::new(RwLock::new(app_state)))
}
