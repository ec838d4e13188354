use thiserror::Error;

use super::ToolError;

/// Startup problems: bad environment or flags. Never reaches the agent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },

    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("unknown tool tier '{0}' (expected full or helper)")]
    UnknownToolTier(String),
}

impl From<ConfigError> for ToolError {
    fn from(err: ConfigError) -> Self {
        ToolError::invalid_params(err.to_string())
    }
}
