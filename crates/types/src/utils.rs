//! Utility functions and helpers

use serde_json::Value;
use url::Url;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("mapconf/", env!("CARGO_PKG_VERSION"));

/// Headers owned by a dedicated option rather than `defaultHeaders`,
/// as lower-case header name and owning option
const RESERVED_HEADERS: [(&str, &str); 2] = [("accept", "acceptHeader"), ("user-agent", "userAgent")];

/// Human-readable name of a value's shape, for error messages
pub fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Parse an absolute http(s) URL, describing why it was refused otherwise
pub fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("scheme must be http or https, got {}", other)),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }

    Ok(url)
}

/// Check that a MIME type has the `type/subtype` form
pub fn is_valid_mime_type(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence.split_once('/') {
        Some((kind, subtype)) => {
            let token = |s: &str| {
                !s.is_empty()
                    && s.chars()
                        .all(|c| c.is_ascii_alphanumeric() || "!#$&^_.+-*".contains(c))
            };
            token(kind) && token(subtype)
        }
        None => false,
    }
}

/// Option that owns a header, when the header may not be set as a plain
/// default header
pub fn reserved_header_option(name: &str) -> Option<&'static str> {
    RESERVED_HEADERS
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, option)| *option)
}

/// Convert a camelCase option name to its snake_case alias
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && !chars[i - 1].is_ascii_uppercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
