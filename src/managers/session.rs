use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::session::SessionManager;
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;

pub const SESSION_TOOLS: &[&str] = &["generate_session", "get_session", "kill_session"];

/// MCP surface for the session lifecycle.
#[derive(Clone)]
pub struct SessionToolManager {
    logger: Logger,
    validation: Validation,
    session: Arc<SessionManager>,
}

impl SessionToolManager {
    pub fn new(logger: Logger, validation: Validation, session: Arc<SessionManager>) -> Self {
        Self {
            logger: logger.child("session_tools"),
            validation,
            session,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        match tool {
            "generate_session" => self.generate_session(&args).await,
            "get_session" => self.get_session(),
            "kill_session" => self.kill_session().await,
            _ => Err(unknown_tool_error(tool, SESSION_TOOLS)),
        }
    }

    async fn generate_session(&self, args: &Value) -> Result<ToolOutput, ToolError> {
        let credentials = self.validation.ensure_optional_credentials(args)?;
        let session_id = self.session.create_session(credentials).await?;
        Ok(ToolOutput::ok(serde_json::json!({
            "session_id": session_id,
            "message": "Logged into Leostream. Session saved, valid for the next 12 hours.",
        })))
    }

    fn get_session(&self) -> Result<ToolOutput, ToolError> {
        let status = self.session.get_session()?;
        if !status.is_valid() {
            self.logger.info(
                "Stored session is stale",
                Some(&serde_json::json!({ "age_seconds": status.age_seconds })),
            );
        }
        Ok(ToolOutput::ok(serde_json::json!({
            "status": status.state,
            "session_id": status.token,
            "age_seconds": status.age_seconds,
            "saved_at": status.modified_at.to_rfc3339(),
            "message": status.message(),
        })))
    }

    async fn kill_session(&self) -> Result<ToolOutput, ToolError> {
        let receipt = self.session.kill_session().await?;
        Ok(ToolOutput::ok(serde_json::json!({
            "message": format!("Session {} killed successfully.", receipt.token),
            "cleared": receipt.cleared,
            "response": receipt.response,
        })))
    }
}

#[async_trait::async_trait]
impl ToolHandler for SessionToolManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        self.handle_tool(tool, args).await
    }
}
