pub mod network {
    pub const DEFAULT_BASE_URL: &str = "https://leostream.domain.org";
    pub const DEFAULT_API_PREFIX: &str = "/rest/v1";
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
    pub const QUERY_ONLY_METHODS: &[&str] = &["GET", "DELETE", "HEAD", "OPTIONS"];
    pub const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];
}

pub mod session {
    pub const LOGIN_PATH: &str = "/session/login";
    pub const LOGOUT_PATH: &str = "/session/logout";
    pub const TOKEN_FIELD: &str = "sid";
    /// 12 hours.
    pub const MAX_AGE_SECS: i64 = 43_200;
    pub const FILE_MODE: u32 = 0o600;
}

pub mod catalog {
    pub const DEFAULT_DB_FILE: &str = "api_schema4_leostream.db";
    pub const TABLE: &str = "api_endpoints";
    pub const ABSENT_MARKER: &str = "None";
    pub const NO_MATCH_MESSAGE: &str = "No matching endpoints found";
}

pub mod limits {
    pub const LOG_BODY_PREVIEW_BYTES: usize = 512;
    pub const TOKEN_FINGERPRINT_CHARS: usize = 12;
}
