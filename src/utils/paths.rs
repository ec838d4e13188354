use std::env;
use std::path::PathBuf;

pub(crate) fn normalize_env_value(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "undefined" || lowered == "null" {
        return None;
    }
    Some(trimmed.to_string())
}

pub(crate) fn env_value(key: &str) -> Option<String> {
    normalize_env_value(env::var(key).ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_value(key).map(|raw| expand_home_path(&raw))
}

pub fn expand_home_path(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    if raw == "~" {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home);
        }
    }
    PathBuf::from(raw)
}

fn resolve_xdg_state_dir() -> Option<PathBuf> {
    if let Some(path) = env_path("XDG_STATE_HOME") {
        return Some(path);
    }
    env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("state"))
}

pub fn resolve_state_dir() -> PathBuf {
    if let Some(path) = env_path("LEOSTREAM_STATE_DIR") {
        return path;
    }
    if let Some(path) = resolve_xdg_state_dir() {
        return path.join("leostream");
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn resolve_session_path() -> PathBuf {
    if let Some(path) = env_path("LEOSTREAM_SESSION_PATH") {
        return path;
    }
    resolve_state_dir().join("session.json")
}

/// The catalog ships next to the binary's working directory by default.
pub fn resolve_catalog_path() -> PathBuf {
    if let Some(path) = env_path("LEOSTREAM_CATALOG_PATH") {
        return path;
    }
    PathBuf::from(crate::constants::catalog::DEFAULT_DB_FILE)
}
