use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::tool_errors::unknown_tool_error;

/// Payload produced by a tool. `is_error` marks failures; a payload may still
/// carry an `error` key without being one (an empty catalog search).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub payload: Value,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(payload: Value) -> Self {
        Self {
            payload,
            is_error: false,
        }
    }

    pub fn failed(payload: Value) -> Self {
        Self {
            payload,
            is_error: true,
        }
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError>;
}

#[derive(Debug, Clone)]
pub struct ToolCallResult {
    pub tool: String,
    pub output: ToolOutput,
    pub duration_ms: u64,
    pub trace_id: String,
}

impl ToolCallResult {
    pub fn meta(&self) -> Value {
        serde_json::json!({
            "tool": self.tool,
            "duration_ms": self.duration_ms,
            "trace_id": self.trace_id,
        })
    }
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn tool_names(&self) -> BTreeSet<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Runs a tool and folds any error into the payload, so callers always
    /// get data back.
    pub async fn execute(&self, name: &str, args: Value) -> ToolCallResult {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let output = match self.handlers.get(name) {
            Some(handler) => match handler.handle(name, args).await {
                Ok(output) => output,
                Err(err) => {
                    self.logger.warn(
                        "Tool failed",
                        Some(&serde_json::json!({
                            "tool": name,
                            "trace_id": trace_id,
                            "kind": err.kind.as_str(),
                            "error": err.message,
                        })),
                    );
                    ToolOutput::failed(err.to_payload())
                }
            },
            None => {
                let known: Vec<String> = self.tool_names().into_iter().collect();
                ToolOutput::failed(unknown_tool_error(name, &known).to_payload())
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        self.logger.debug(
            "Tool call finished",
            Some(&serde_json::json!({
                "tool": name,
                "trace_id": trace_id,
                "duration_ms": duration_ms,
                "is_error": output.is_error,
            })),
        );
        ToolCallResult {
            tool: name.to_string(),
            output,
            duration_ms,
            trace_id,
        }
    }
}
