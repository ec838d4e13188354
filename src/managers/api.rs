use crate::constants::catalog::NO_MATCH_MESSAGE;
use crate::errors::ToolError;
use crate::services::endpoint_catalog::EndpointCatalog;
use crate::services::forwarder::{ForwardRequest, RequestForwarder};
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;

pub const API_TOOLS: &[&str] = &["run_api", "query_api"];

/// `run_api` proxies to the remote REST API; `query_api` searches the local
/// endpoint catalog.
#[derive(Clone)]
pub struct ApiToolManager {
    logger: Logger,
    validation: Validation,
    forwarder: Arc<RequestForwarder>,
    catalog: Arc<EndpointCatalog>,
}

impl ApiToolManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        forwarder: Arc<RequestForwarder>,
        catalog: Arc<EndpointCatalog>,
    ) -> Self {
        Self {
            logger: logger.child("api_tools"),
            validation,
            forwarder,
            catalog,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        match tool {
            "run_api" => self.run_api(args).await,
            "query_api" => self.query_api(&args),
            _ => Err(unknown_tool_error(tool, API_TOOLS)),
        }
    }

    async fn run_api(&self, mut args: Value) -> Result<ToolOutput, ToolError> {
        // The path goes out untouched. An empty one targets the API prefix itself.
        let path = self.validation.ensure_text(args.get("query"), "query")?;
        let method = self
            .validation
            .ensure_string(args.get("method"), "method", true)?;
        let data = args.get_mut("data").map(Value::take);
        let params = args.get_mut("params").map(Value::take);

        let request = ForwardRequest::new(path, &method)?
            .with_data(data)
            .with_params(params);
        let outcome = self.forwarder.forward(&request).await;
        if outcome.is_success() {
            Ok(ToolOutput::ok(outcome.into_value()))
        } else {
            Ok(ToolOutput::failed(outcome.into_value()))
        }
    }

    fn query_api(&self, args: &Value) -> Result<ToolOutput, ToolError> {
        let query = self.validation.ensure_text(args.get("query"), "query")?;
        let records = self.catalog.search(&query)?;
        if records.is_empty() {
            self.logger.info(
                "No catalog match",
                Some(&serde_json::json!({ "query": query })),
            );
            return Ok(ToolOutput::ok(serde_json::json!({ "error": NO_MATCH_MESSAGE })));
        }
        let listing: Vec<Value> = records.iter().map(|record| record.to_listing()).collect();
        Ok(ToolOutput::ok(serde_json::json!({ "available_paths": listing })))
    }
}

#[async_trait::async_trait]
impl ToolHandler for ApiToolManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        self.handle_tool(tool, args).await
    }
}
