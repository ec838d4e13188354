pub mod endpoint_catalog;
pub mod forwarder;
pub mod http_client;
pub mod logger;
pub mod session;
pub mod settings;
pub mod tool_executor;
pub mod validation;
