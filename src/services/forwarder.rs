use crate::constants::limits::LOG_BODY_PREVIEW_BYTES;
use crate::constants::network::QUERY_ONLY_METHODS;
use crate::errors::{ToolError, ToolErrorKind};
use crate::services::http_client::{
    bearer_value, map_reqwest_error, status_error_message, HttpClient,
};
use crate::services::logger::Logger;
use crate::services::settings::Settings;
use crate::stores::SessionStore;
use crate::utils::redact::{redact_text, token_fingerprint};
use crate::utils::text::normalize_method;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// One proxied call. Built through `new` so the method is always valid.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    path: String,
    method: Method,
    data: Option<Value>,
    params: Option<Value>,
}

impl ForwardRequest {
    pub fn new(path: impl Into<String>, method: &str) -> Result<Self, ToolError> {
        let normalized = normalize_method(method).ok_or_else(|| {
            ToolError::invalid_params(format!("Unsupported HTTP method: {}", method.trim()))
                .with_hint("Use one of GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS.")
        })?;
        let method = Method::from_bytes(normalized.as_bytes())
            .map_err(|_| ToolError::invalid_params(format!("Invalid HTTP method: {}", method)))?;
        Ok(Self {
            path: path.into(),
            method,
            data: None,
            params: None,
        })
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data.filter(|v| !v.is_null());
        self
    }

    pub fn with_params(mut self, params: Option<Value>) -> Self {
        self.params = params.filter(|v| !v.is_null());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    fn sends_query_only(&self) -> bool {
        QUERY_ONLY_METHODS.contains(&self.method.as_str())
    }
}

/// Result of a forwarded call. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardOutcome {
    Success(Value),
    HttpStatus {
        status: u16,
        message: String,
        body: String,
    },
    Transport {
        message: String,
        timed_out: bool,
    },
}

impl ForwardOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ForwardOutcome::Success(_))
    }

    /// Success is the decoded body. Failures use the tool error payload, with
    /// `details` holding the raw response text for status errors.
    pub fn into_value(self) -> Value {
        match self {
            ForwardOutcome::Success(value) => value,
            ForwardOutcome::HttpStatus {
                status,
                message,
                body,
            } => {
                let mut payload = ToolError::new(ToolErrorKind::HttpStatus, "HTTP_STATUS", message)
                    .with_details(Value::String(body))
                    .to_payload();
                payload["status"] = Value::from(status);
                payload
            }
            ForwardOutcome::Transport { message, timed_out } => {
                let err = if timed_out {
                    ToolError::timeout(message)
                } else {
                    ToolError::transport(message)
                };
                err.to_payload()
            }
        }
    }

    fn from_tool_error(err: ToolError) -> Self {
        ForwardOutcome::Transport {
            timed_out: err.kind == ToolErrorKind::Timeout,
            message: err.message,
        }
    }
}

pub struct RequestForwarder {
    logger: Logger,
    settings: Arc<Settings>,
    http: HttpClient,
    store: Arc<dyn SessionStore>,
}

impl RequestForwarder {
    pub fn new(
        logger: Logger,
        settings: Arc<Settings>,
        http: HttpClient,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            logger: logger.child("forwarder"),
            settings,
            http,
            store,
        }
    }

    pub fn target_url(&self, path: &str) -> String {
        self.settings.api_url(path)
    }

    fn current_token(&self) -> Option<String> {
        match self.store.load() {
            Ok(Some(token)) => Some(token.value),
            Ok(None) => {
                self.logger.warn(
                    "No stored session; forwarding without Authorization header",
                    Some(&serde_json::json!({ "store": self.store.location() })),
                );
                None
            }
            Err(err) => {
                self.logger.warn(
                    "Failed to read stored session; forwarding without Authorization header",
                    Some(&serde_json::json!({ "error": err.message })),
                );
                None
            }
        }
    }

    pub async fn forward(&self, request: &ForwardRequest) -> ForwardOutcome {
        let url = self.target_url(&request.path);
        let mut builder = self
            .http
            .inner()
            .request(request.method.clone(), &url)
            .timeout(self.settings.timeout);

        let token = self.current_token();
        if let Some(token) = token.as_deref() {
            match bearer_value(token) {
                Ok(value) => builder = builder.header(AUTHORIZATION, value),
                Err(err) => return ForwardOutcome::from_tool_error(err),
            }
        }

        if request.sends_query_only() {
            let source = request.data.as_ref().or(request.params.as_ref());
            if let Some(source) = source {
                builder = builder.query(&query_pairs(source));
            }
        } else {
            if let Some(data) = request.data.as_ref() {
                builder = builder.json(data);
            }
            if let Some(params) = request.params.as_ref() {
                builder = builder.query(&query_pairs(params));
            }
        }

        self.logger.debug(
            "Forwarding request",
            Some(&serde_json::json!({
                "method": request.method.as_str(),
                "url": url,
                "token": token.as_deref().map(token_fingerprint),
            })),
        );

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                let mapped = map_reqwest_error(&err);
                self.logger.warn(
                    "Forwarded request failed",
                    Some(&serde_json::json!({
                        "method": request.method.as_str(),
                        "url": url,
                        "error": mapped.message,
                    })),
                );
                return ForwardOutcome::from_tool_error(mapped);
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => return ForwardOutcome::from_tool_error(map_reqwest_error(&err)),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        if !status.is_success() {
            self.logger.info(
                "Remote API returned an error status",
                Some(&serde_json::json!({
                    "method": request.method.as_str(),
                    "url": final_url,
                    "status": status.as_u16(),
                    "duration_ms": duration_ms,
                    "body": redact_text(&text, LOG_BODY_PREVIEW_BYTES),
                })),
            );
            return ForwardOutcome::HttpStatus {
                status: status.as_u16(),
                message: status_error_message(status, &final_url),
                body: text,
            };
        }

        self.logger.info(
            "Forwarded request completed",
            Some(&serde_json::json!({
                "method": request.method.as_str(),
                "url": final_url,
                "status": status.as_u16(),
                "duration_ms": duration_ms,
            })),
        );
        ForwardOutcome::Success(decode_body(&text))
    }
}

/// JSON when the body parses, `null` when empty, raw text otherwise.
pub fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Flattens caller data into query pairs. Arrays repeat the key and nested
/// objects are JSON encoded. A string is read as an urlencoded query.
pub fn query_pairs(value: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    match value {
        Value::Object(map) => {
            for (key, entry) in map {
                match entry {
                    Value::Null => {}
                    Value::Array(items) => {
                        for item in items {
                            pairs.push((key.clone(), scalar_to_query(item)));
                        }
                    }
                    other => pairs.push((key.clone(), scalar_to_query(other))),
                }
            }
        }
        Value::String(raw) => {
            let trimmed = raw.trim_start_matches('?');
            for (key, val) in url::form_urlencoded::parse(trimmed.as_bytes()) {
                pairs.push((key.into_owned(), val.into_owned()));
            }
        }
        Value::Array(items) => {
            for item in items.iter().filter_map(Value::as_array) {
                if let [Value::String(key), val] = item.as_slice() {
                    pairs.push((key.clone(), scalar_to_query(val)));
                }
            }
        }
        _ => {}
    }
    pairs
}

fn scalar_to_query(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
