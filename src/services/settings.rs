use crate::constants::{network, session};
use crate::errors::ConfigError;
use crate::utils::feature_flags::is_insecure_tls_enabled;
use crate::utils::paths::{env_value, resolve_catalog_path, resolve_session_path};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTier {
    /// Session tools plus run_api and query_api.
    Full,
    /// Catalog lookup only.
    Helper,
}

impl ToolTier {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_lowercase().as_str() {
            "" | "full" => Ok(ToolTier::Full),
            "helper" => Ok(ToolTier::Helper),
            other => Err(ConfigError::UnknownToolTier(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolTier::Full => "full",
            ToolTier::Helper => "helper",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user_login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_login: user_login.into(),
            password: password.into(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let user = env_value("LEOSTREAM_USER")?;
        let password = env_value("LEOSTREAM_PASSWORD")?;
        Some(Self::new(user, password))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_login", &self.user_login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub api_prefix: String,
    pub session_path: PathBuf,
    pub catalog_path: PathBuf,
    pub timeout: Duration,
    pub insecure_tls: bool,
    pub credentials: Option<Credentials>,
    pub tool_tier: ToolTier,
}

impl Settings {
    /// Defaults for everything except the remote host.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            api_prefix: network::DEFAULT_API_PREFIX.to_string(),
            session_path: resolve_session_path(),
            catalog_path: resolve_catalog_path(),
            timeout: Duration::from_millis(network::TIMEOUT_API_REQUEST_MS),
            insecure_tls: false,
            credentials: None,
            tool_tier: ToolTier::Full,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_value("LEOSTREAM_BASE_URL")
            .or_else(|| env_value("LEOSTREAM_HOST").map(|host| format!("https://{}", host)))
            .unwrap_or_else(|| network::DEFAULT_BASE_URL.to_string());
        let mut settings = Self::new(&base_url)?;
        if let Some(prefix) = env_value("LEOSTREAM_API_PREFIX") {
            settings.api_prefix = normalize_prefix(&prefix);
        }
        if let Some(raw) = env_value("LEOSTREAM_TIMEOUT_MS") {
            let millis = raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidNumber {
                    key: "LEOSTREAM_TIMEOUT_MS",
                    value: raw.clone(),
                })?;
            settings.timeout = Duration::from_millis(millis);
        }
        if let Some(tier) = env_value("LEOSTREAM_TOOL_TIER") {
            settings.tool_tier = ToolTier::parse(&tier)?;
        }
        settings.insecure_tls = is_insecure_tls_enabled();
        settings.credentials = Credentials::from_env();
        Ok(settings)
    }

    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = path.into();
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = path.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tool_tier(mut self, tier: ToolTier) -> Self {
        self.tool_tier = tier;
        self
    }

    /// Base URL, API prefix and caller path joined verbatim.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    pub fn login_url(&self) -> String {
        self.api_url(session::LOGIN_PATH)
    }

    pub fn logout_url(&self) -> String {
        self.api_url(session::LOGOUT_PATH)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| ConfigError::InvalidBaseUrl {
        value: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            value: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidBaseUrl {
            value: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
