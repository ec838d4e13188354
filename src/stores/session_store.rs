use crate::errors::ToolError;
use chrono::{DateTime, Utc};

/// The persisted bearer token and the moment it was last written.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub value: String,
    pub modified_at: DateTime<Utc>,
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("value", &crate::utils::redact::token_fingerprint(&self.value))
            .field("modified_at", &self.modified_at)
            .finish()
    }
}

/// Holds at most one live token. Implementations must make `save`
/// atomic with respect to concurrent `load` calls.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredToken>, ToolError>;

    /// Replaces any previous token; the store stamps the write time.
    fn save(&self, token: &str) -> Result<StoredToken, ToolError>;

    /// Returns whether a token was present.
    fn clear(&self) -> Result<bool, ToolError>;

    fn location(&self) -> String;
}
