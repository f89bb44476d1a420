//! Utility functions and helpers

/// Escape text for inclusion in HTML element content or quoted attributes
pub fn escape_html(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape an optional value, rendering `None` as an empty string
pub fn escape_opt(content: Option<&str>) -> String {
    content.map(escape_html).unwrap_or_default()
}

/// Value for the `cacheBuster` query parameter: current time in epoch millis
pub fn cache_buster() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
