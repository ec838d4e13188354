use crate::constants::limits::TOKEN_FINGERPRINT_CHARS;
use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "password",
        "sid",
        "session_id",
        "token",
        "authorization",
        "proxy-authorization",
        "cookie",
        "set-cookie",
    ]
    .into_iter()
    .collect()
});

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~+/=-]{6,})").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r#""(sid|password|session_id)"\s*:\s*"[^"]*""#)
                .expect("inline redaction regex"),
            "\"$1\":\"***REDACTED***\"",
        ),
        (
            Regex::new(r#"\b(password|sid|token)\b\s*([:=])\s*([^\s"'`&]+)"#)
                .expect("inline redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    SENSITIVE_KEYS.contains(normalized.as_str())
        || normalized.contains("password")
        || normalized.contains("token")
}

pub fn redact_text(value: &str, max_bytes: usize) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    if max_bytes != usize::MAX && out.len() > max_bytes {
        return format!("{}...", truncate_utf8_prefix(&out, max_bytes));
    }
    out
}

pub fn redact_object(value: &Value, max_bytes: usize) -> Value {
    match value {
        Value::String(text) => Value::String(redact_text(text, max_bytes)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| redact_object(item, max_bytes))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map.iter() {
                if is_sensitive_key(key) && !entry.is_null() {
                    out.insert(key.clone(), Value::String(DEFAULT_REDACTION.to_string()));
                    continue;
                }
                out.insert(key.clone(), redact_object(entry, max_bytes));
            }
            Value::Object(out)
        }
        _ => value.clone(),
    }
}

/// Short stable identifier for a token, safe to log.
pub fn token_fingerprint(token: &str) -> String {
    let digest = hex::encode(Sha256::digest(token.as_bytes()));
    format!("sha256:{}", &digest[..TOKEN_FINGERPRINT_CHARS])
}
