use crate::constants::network::USER_AGENT;
use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::settings::Settings;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};

/// One reqwest client per bridge, configured from `Settings`.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(logger: &Logger, settings: &Settings) -> Result<Self, ToolError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::none());
        if settings.insecure_tls {
            logger.warn(
                "TLS certificate verification is disabled",
                Some(&serde_json::json!({ "base_url": settings.base_url })),
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self { client })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

pub fn bearer_value(token: &str) -> Result<HeaderValue, ToolError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
        ToolError::internal("Stored session id contains characters not allowed in a header")
            .with_hint("Generate a new session.")
    })?;
    value.set_sensitive(true);
    Ok(value)
}

pub fn map_reqwest_error(err: &reqwest::Error) -> ToolError {
    if err.is_timeout() {
        return ToolError::timeout(format!("HTTP request timed out: {}", err));
    }
    ToolError::transport(err.to_string())
}

/// Message for a non-2xx status, phrased like common HTTP clients do.
pub fn status_error_message(status: StatusCode, url: &str) -> String {
    let class = if status.is_redirection() {
        "Redirect response"
    } else if status.is_client_error() {
        "Client error"
    } else if status.is_server_error() {
        "Server error"
    } else {
        "Unexpected response"
    };
    let reason = status.canonical_reason().unwrap_or("");
    let label = format!("{} {}", status.as_u16(), reason);
    format!("{} '{}' for url '{}'", class, label.trim_end(), url)
}
