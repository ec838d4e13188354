pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if max_bytes == 0 {
        return String::new();
    }
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

/// Uppercases and validates an HTTP method name.
pub fn normalize_method(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    if crate::constants::network::ALLOWED_METHODS.contains(&upper.as_str()) {
        Some(upper)
    } else {
        None
    }
}
