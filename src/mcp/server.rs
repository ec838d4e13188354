use crate::app::App;
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::{
    list_tools, tool_by_name, tool_catalog, tool_in_tier, validate_tool_args,
};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, ToolCallParams};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolCallResult;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "leostream-bridge";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP tool result: the payload as text plus `structuredContent` when it is
/// an object.
pub fn build_tool_envelope(result: &ToolCallResult) -> Value {
    let payload = &result.output.payload;
    let text = serde_json::to_string(payload).unwrap_or_else(|_| "null".to_string());
    let mut envelope = serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "isError": result.output.is_error,
        "_meta": result.meta(),
    });
    if payload.is_object() {
        envelope["structuredContent"] = payload.clone();
    }
    envelope
}

pub struct McpServer {
    app: Arc<App>,
    logger: Logger,
}

impl McpServer {
    pub fn new(app: Arc<App>) -> Self {
        let logger = app.logger.child("mcp");
        Self { app, logger }
    }

    pub fn from_env() -> Result<Self, ToolError> {
        let app = App::initialize()?;
        Ok(Self::new(Arc::new(app)))
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": list_tools(self.app.settings.tool_tier) })
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, McpError> {
        let call = ToolCallParams::from_params(params)?;
        let name = call.name.trim();
        let tier = self.app.settings.tool_tier;
        if tool_by_name(name).is_none() {
            let known: Vec<&str> = tool_catalog().iter().map(|tool| tool.name.as_str()).collect();
            let err = unknown_tool_error(name, &known);
            let message = match err.hint {
                Some(hint) => format!("{} ({})", err.message, hint),
                None => err.message,
            };
            return Err(McpError::invalid_params(message));
        }
        if !tool_in_tier(name, tier) {
            return Err(McpError::invalid_params(format!(
                "Tool {} is not available in the {} tool tier",
                name,
                tier.as_str()
            )));
        }
        let args = call.arguments();
        validate_tool_args(name, &args)?;

        let result = self.app.tool_executor.execute(name, args).await;
        Ok(build_tool_envelope(&result))
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.method.starts_with("notifications/") {
            return None;
        }
        let id = request.id?;
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.handle_initialize()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.handle_tools_list()),
            "tools/call" => match self.handle_tools_call(&request.params).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(err) => JsonRpcResponse::from_error(id, err),
            },
            other => {
                self.logger.debug(
                    "Unknown JSON-RPC method",
                    Some(&serde_json::json!({ "method": other })),
                );
                JsonRpcResponse::failure(
                    id,
                    ErrorCode::MethodNotFound.as_i32(),
                    "Method not found".to_string(),
                )
            }
        };
        Some(response)
    }

    /// One line of input to at most one line of output. Notifications get no
    /// reply.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let parsed: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError.as_i32(),
                    "Parse error".to_string(),
                ))
            }
        };
        match serde_json::from_value::<JsonRpcRequest>(parsed) {
            Ok(request) => self.dispatch(request).await,
            Err(_) => Some(JsonRpcResponse::failure(
                Value::Null,
                ErrorCode::InvalidRequest.as_i32(),
                "Invalid request".to_string(),
            )),
        }
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin).lines();
        let mut writer = BufWriter::new(stdout);
        self.logger.info(
            "MCP server listening on stdio",
            Some(&serde_json::json!({
                "base_url": self.app.settings.base_url,
                "tool_tier": self.app.settings.tool_tier.as_str(),
            })),
        );

        while let Some(line) = reader.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(trimmed).await {
                let payload = serde_json::to_string(&response)
                    .map_err(|err| ToolError::internal(err.to_string()))?;
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        self.logger.info("stdin closed, shutting down", None);
        Ok(())
    }
}

pub async fn run_stdio() -> Result<(), ToolError> {
    McpServer::from_env()?.run_stdio().await
}
