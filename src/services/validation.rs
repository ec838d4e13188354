use crate::errors::ToolError;
use crate::services::settings::Credentials;
use serde_json::Value;

#[derive(Clone, Default)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(
        &self,
        value: Option<&Value>,
        label: &str,
        trim: bool,
    ) -> Result<String, ToolError> {
        let text = value.and_then(Value::as_str).ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(if trim {
            normalized.to_string()
        } else {
            text.to_string()
        })
    }

    /// Any string, empty included, kept exactly as given.
    pub fn ensure_text(&self, value: Option<&Value>, label: &str) -> Result<String, ToolError> {
        value
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ToolError::invalid_params(format!("{} must be a string", label)))
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
        trim: bool,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => self.ensure_string(Some(val), label, trim).map(Some),
        }
    }

    /// Both halves or neither; a lone user name or password is a caller mistake.
    pub fn ensure_optional_credentials(&self, args: &Value) -> Result<Option<Credentials>, ToolError> {
        let user = self.ensure_optional_string(args.get("user_login"), "user_login", true)?;
        let password = self.ensure_optional_string(args.get("password"), "password", false)?;
        match (user, password) {
            (Some(user), Some(password)) => Ok(Some(Credentials::new(user, password))),
            (None, None) => Ok(None),
            _ => Err(ToolError::invalid_params(
                "user_login and password must be supplied together",
            )),
        }
    }
}
