use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    Auth,
    NotFound,
    Transport,
    Timeout,
    HttpStatus,
    Internal,
}

impl ToolErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolErrorKind::InvalidParams => "invalid_params",
            ToolErrorKind::Auth => "auth",
            ToolErrorKind::NotFound => "not_found",
            ToolErrorKind::Transport => "transport",
            ToolErrorKind::Timeout => "timeout",
            ToolErrorKind::HttpStatus => "http_status",
            ToolErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: matches!(kind, ToolErrorKind::Timeout | ToolErrorKind::Transport),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Auth, "AUTH_FAILED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Transport, "TRANSPORT", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, "TIMEOUT", message)
    }

    /// Non-2xx answer from the remote API. `body` is the raw response text.
    pub fn http_status(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::HttpStatus, "HTTP_STATUS", message).with_details(
            serde_json::json!({
                "status": status,
                "body": body.into(),
            }),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    /// Flattened form handed back to the agent: always carries an `error` key.
    pub fn to_payload(&self) -> Value {
        let mut out = serde_json::Map::new();
        out.insert("error".to_string(), Value::String(self.message.clone()));
        out.insert("code".to_string(), Value::String(self.code.clone()));
        out.insert(
            "kind".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        out.insert("retryable".to_string(), Value::Bool(self.retryable));
        if let Some(hint) = &self.hint {
            out.insert("hint".to_string(), Value::String(hint.clone()));
        }
        if let Some(details) = &self.details {
            out.insert("details".to_string(), details.clone());
        }
        Value::Object(out)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

impl From<rusqlite::Error> for ToolError {
    fn from(err: rusqlite::Error) -> Self {
        ToolError::internal(format!("Endpoint catalog query failed: {}", err))
    }
}
