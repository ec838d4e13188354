use crate::errors::ToolError;
use crate::stores::session_store::{SessionStore, StoredToken};
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// Process-local store; nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    token: Arc<RwLock<Option<StoredToken>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a token with an explicit write time.
    pub fn with_token(value: &str, modified_at: DateTime<Utc>) -> Self {
        let store = Self::new();
        store.set_token(value, modified_at);
        store
    }

    pub fn set_token(&self, value: &str, modified_at: DateTime<Utc>) {
        let mut guard = self.token.write().unwrap_or_else(|err| err.into_inner());
        *guard = Some(StoredToken {
            value: value.to_string(),
            modified_at,
        });
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredToken>, ToolError> {
        let guard = self.token.read().unwrap_or_else(|err| err.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, token: &str) -> Result<StoredToken, ToolError> {
        if token.is_empty() {
            return Err(ToolError::invalid_params("Refusing to store an empty session id"));
        }
        let stored = StoredToken {
            value: token.to_string(),
            modified_at: Utc::now(),
        };
        let mut guard = self.token.write().unwrap_or_else(|err| err.into_inner());
        *guard = Some(stored.clone());
        Ok(stored)
    }

    fn clear(&self) -> Result<bool, ToolError> {
        let mut guard = self.token.write().unwrap_or_else(|err| err.into_inner());
        Ok(guard.take().is_some())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
