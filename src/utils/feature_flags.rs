pub fn is_truthy(value: impl AsRef<str>) -> bool {
    matches!(
        value.as_ref().trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn is_truthy_any_env(keys: &[&str]) -> bool {
    keys.iter()
        .any(|key| std::env::var(key).ok().map(is_truthy).unwrap_or(false))
}

/// Skips certificate verification against the Leostream host. Off unless set.
pub fn is_insecure_tls_enabled() -> bool {
    is_truthy_any_env(&["LEOSTREAM_INSECURE_TLS"])
}

#[cfg(test)]
mod tests {
    use super::is_truthy;

    #[test]
    fn truthy_values() {
        for value in ["1", "true", " YES ", "on"] {
            assert!(is_truthy(value), "{value} should be truthy");
        }
        for value in ["0", "false", "", "enabled"] {
            assert!(!is_truthy(value), "{value} should not be truthy");
        }
    }
}
