use crate::constants::limits::LOG_BODY_PREVIEW_BYTES;
use crate::constants::session::{MAX_AGE_SECS, TOKEN_FIELD};
use crate::errors::ToolError;
use crate::services::forwarder::decode_body;
use crate::services::http_client::{
    bearer_value, map_reqwest_error, status_error_message, HttpClient,
};
use crate::services::logger::Logger;
use crate::services::settings::{Credentials, Settings};
use crate::stores::SessionStore;
use crate::utils::redact::{redact_text, token_fingerprint};
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Valid,
    Stale,
}

impl SessionState {
    /// Twelve hours and older is stale; the boundary itself is stale.
    pub fn classify(age_seconds: i64) -> Self {
        if age_seconds < MAX_AGE_SECS {
            SessionState::Valid
        } else {
            SessionState::Stale
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub token: String,
    pub age_seconds: i64,
    pub state: SessionState,
    pub modified_at: DateTime<Utc>,
}

impl SessionStatus {
    pub fn is_valid(&self) -> bool {
        self.state == SessionState::Valid
    }

    pub fn message(&self) -> String {
        match self.state {
            SessionState::Valid => format!(
                "Found Valid Session: {} | Age: {} seconds",
                self.token, self.age_seconds
            ),
            SessionState::Stale => format!(
                "Found a Session, but it is not valid (Over 12Hrs Old), please generate another one: {} [Kill This Session ID]",
                self.token
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogoutReceipt {
    pub token: String,
    pub cleared: bool,
    pub response: Value,
}

pub struct SessionManager {
    logger: Logger,
    settings: Arc<Settings>,
    http: HttpClient,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(
        logger: Logger,
        settings: Arc<Settings>,
        http: HttpClient,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            logger: logger.child("session"),
            settings,
            http,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    fn resolve_credentials(&self, supplied: Option<Credentials>) -> Result<Credentials, ToolError> {
        supplied
            .or_else(|| self.settings.credentials.clone())
            .ok_or_else(|| {
                ToolError::invalid_params("No Leostream credentials available")
                    .with_hint("Pass user_login and password, or set LEOSTREAM_USER and LEOSTREAM_PASSWORD.")
            })
    }

    /// Logs in and persists the returned session id, replacing any previous one.
    pub async fn create_session(&self, credentials: Option<Credentials>) -> Result<String, ToolError> {
        let credentials = self.resolve_credentials(credentials)?;
        let url = self.settings.login_url();
        let response = self
            .http
            .inner()
            .post(&url)
            .timeout(self.settings.timeout)
            .json(&serde_json::json!({
                "user_login": credentials.user_login,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(|err| map_reqwest_error(&err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| map_reqwest_error(&err))?;

        let sid = extract_session_id(&text);
        let Some(sid) = sid else {
            self.logger.warn(
                "Failed to login",
                Some(&serde_json::json!({
                    "url": url,
                    "status": status.as_u16(),
                    "user_login": credentials.user_login,
                    "body": redact_text(&text, LOG_BODY_PREVIEW_BYTES),
                })),
            );
            let mut err = ToolError::auth(format!(
                "Failed to login: response did not contain '{}'",
                TOKEN_FIELD
            ))
            .with_details(serde_json::json!({ "status": status.as_u16() }));
            if !status.is_success() {
                err = err.with_hint(status_error_message(status, &url));
            }
            return Err(err);
        };

        let stored = self.store.save(&sid)?;
        self.logger.info(
            "Session saved",
            Some(&serde_json::json!({
                "fingerprint": token_fingerprint(&stored.value),
                "store": self.store.location(),
            })),
        );
        Ok(stored.value)
    }

    pub fn get_session(&self) -> Result<SessionStatus, ToolError> {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> Result<SessionStatus, ToolError> {
        let stored = self.store.load()?.ok_or_else(|| {
            ToolError::not_found("No stored session found")
                .with_hint("Call generate_session to log in.")
        })?;
        let age_seconds = (now - stored.modified_at).num_seconds().max(0);
        Ok(SessionStatus {
            state: SessionState::classify(age_seconds),
            age_seconds,
            token: stored.value,
            modified_at: stored.modified_at,
        })
    }

    /// Invalidates the stored session remotely, then forgets it locally.
    pub async fn kill_session(&self) -> Result<LogoutReceipt, ToolError> {
        let stored = self.store.load()?.ok_or_else(|| {
            ToolError::not_found("No stored session to kill")
                .with_hint("Call generate_session to log in first.")
        })?;
        let url = self.settings.logout_url();
        let response = self
            .http
            .inner()
            .post(&url)
            .timeout(self.settings.timeout)
            .header(AUTHORIZATION, bearer_value(&stored.value)?)
            .send()
            .await
            .map_err(|err| map_reqwest_error(&err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| map_reqwest_error(&err))?;
        if !status.is_success() {
            self.logger.warn(
                "Logout rejected by remote API",
                Some(&serde_json::json!({
                    "status": status.as_u16(),
                    "fingerprint": token_fingerprint(&stored.value),
                })),
            );
            return Err(ToolError::http_status(
                status.as_u16(),
                status_error_message(status, &url),
                text,
            ));
        }

        let cleared = self.store.clear()?;
        self.logger.info(
            "Session killed",
            Some(&serde_json::json!({
                "fingerprint": token_fingerprint(&stored.value),
                "cleared": cleared,
            })),
        );
        Ok(LogoutReceipt {
            token: stored.value,
            cleared,
            response: decode_body(&text),
        })
    }
}

fn extract_session_id(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let sid = parsed.get(TOKEN_FIELD)?.as_str()?;
    (!sid.is_empty()).then(|| sid.to_string())
}
