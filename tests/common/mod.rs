#![allow(dead_code)]

use leostream_bridge::app::App;
use leostream_bridge::services::endpoint_catalog::{EndpointCatalog, EndpointRecord};
use leostream_bridge::services::logger::Logger;
use leostream_bridge::services::settings::{Credentials, Settings};
use leostream_bridge::stores::{FileSessionStore, SessionStore};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn tmp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("leostream-{}-{}", label, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn restore_env(key: &str, previous: Option<String>) {
    match previous {
        Some(value) => std::env::set_var(key, value),
        None => std::env::remove_var(key),
    }
}

/// Settings pointed at a mock server, with all state under `dir`.
pub fn settings_for(base_url: &str, dir: &Path) -> Settings {
    Settings::new(base_url)
        .expect("settings")
        .with_session_path(dir.join("session.json"))
        .with_catalog_path(dir.join("catalog.db"))
        .with_credentials(Credentials::new("admin", "s3cret"))
        .with_timeout(Duration::from_secs(5))
}

pub fn file_store(dir: &Path) -> Arc<FileSessionStore> {
    Arc::new(FileSessionStore::new(dir.join("session.json")))
}

pub fn app_with_store(settings: Settings, store: Arc<dyn SessionStore>) -> App {
    App::with_store(settings, store).expect("app")
}

pub fn record(
    path: &str,
    method: &str,
    description: &str,
    request_body: Option<serde_json::Value>,
) -> EndpointRecord {
    EndpointRecord {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
        request_body,
        responses: Some(serde_json::json!({ "200": { "description": "OK" } })),
    }
}

/// A small catalog resembling the broker's documented endpoints.
pub fn seed_catalog(db_path: &Path) -> EndpointCatalog {
    let catalog = EndpointCatalog::new(Logger::new("test"), db_path);
    catalog.create_schema().expect("schema");
    catalog
        .insert(&record(
            "/rest/v1/session/login",
            "POST",
            "Log in and receive a session id",
            Some(serde_json::json!({
                "type": "object",
                "properties": { "user_login": {}, "password": {} }
            })),
        ))
        .expect("insert login");
    catalog
        .insert(&record(
            "/rest/v1/session/logout",
            "POST",
            "Invalidate the session",
            None,
        ))
        .expect("insert logout");
    catalog
        .insert(&record("/rest/v1/pools", "GET", "List pools", None))
        .expect("insert pools");
    catalog
}
