use crate::errors::ToolError;
use crate::managers::api::ApiToolManager;
use crate::managers::session::SessionToolManager;
use crate::mcp::catalog::tool_catalog;
use crate::services::endpoint_catalog::EndpointCatalog;
use crate::services::forwarder::RequestForwarder;
use crate::services::http_client::HttpClient;
use crate::services::logger::Logger;
use crate::services::session::SessionManager;
use crate::services::settings::Settings;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use crate::stores::{FileSessionStore, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything the bridge needs, built once per process.
pub struct App {
    pub logger: Logger,
    pub settings: Arc<Settings>,
    pub session: Arc<SessionManager>,
    pub forwarder: Arc<RequestForwarder>,
    pub catalog: Arc<EndpointCatalog>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json needs a handler.")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize() -> Result<Self, ToolError> {
        Self::with_settings(Settings::from_env()?)
    }

    pub fn with_settings(settings: Settings) -> Result<Self, ToolError> {
        let store: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::new(settings.session_path.clone()));
        Self::with_store(settings, store)
    }

    /// Wires the services around an explicit token store.
    pub fn with_store(settings: Settings, store: Arc<dyn SessionStore>) -> Result<Self, ToolError> {
        let logger = Logger::new("leostream");
        let validation = Validation::new();
        let settings = Arc::new(settings);
        let http = HttpClient::new(&logger, &settings)?;

        let session = Arc::new(SessionManager::new(
            logger.clone(),
            settings.clone(),
            http.clone(),
            store.clone(),
        ));
        let forwarder = Arc::new(RequestForwarder::new(
            logger.clone(),
            settings.clone(),
            http,
            store,
        ));
        let catalog = Arc::new(EndpointCatalog::new(
            logger.clone(),
            settings.catalog_path.clone(),
        ));

        let session_tools: Arc<dyn ToolHandler> = Arc::new(SessionToolManager::new(
            logger.clone(),
            validation.clone(),
            session.clone(),
        ));
        let api_tools: Arc<dyn ToolHandler> = Arc::new(ApiToolManager::new(
            logger.clone(),
            validation,
            forwarder.clone(),
            catalog.clone(),
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for name in crate::managers::session::SESSION_TOOLS {
            handlers.insert((*name).to_string(), session_tools.clone());
        }
        for name in crate::managers::api::API_TOOLS {
            handlers.insert((*name).to_string(), api_tools.clone());
        }
        Self::validate_tool_wiring(&handlers)?;

        logger.debug(
            "Bridge initialized",
            Some(&serde_json::json!({
                "base_url": settings.base_url,
                "session_store": session.store().location(),
                "catalog": catalog.path().display().to_string(),
                "tool_tier": settings.tool_tier.as_str(),
            })),
        );

        Ok(Self {
            tool_executor: Arc::new(ToolExecutor::new(logger.clone(), handlers)),
            logger,
            settings,
            session,
            forwarder,
            catalog,
        })
    }
}
