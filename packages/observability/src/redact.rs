//! Credential redaction for structured log fields.

use serde_json::{Map, Value};

/// Replacement written in place of a redacted value.
pub const REDACTED: &str = "[REDACTED]";

/// Field names (matched case-insensitively as substrings) whose values never
/// reach a log sink.
const DENYLIST_KEYS: [&str; 8] = [
    "password",
    "passcode",
    "token",
    "authorization",
    "secret",
    "cookie",
    "credential",
    "private_key",
];

/// Returns true when a field named `key` may hold a credential.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

/// Redact `value` if `key` is sensitive or the value looks like a bearer
/// header or a JWT; recurse into objects and arrays.
pub fn sanitize_value(key: &str, value: &Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::String(s) if looks_like_sensitive_value(s) => Value::String(REDACTED.to_string()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), sanitize_value(k, v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_value(key, item))
                .collect::<Vec<_>>(),
        ),
        _ => value.clone(),
    }
}

fn looks_like_sensitive_value(raw: &str) -> bool {
    if raw.to_ascii_lowercase().starts_with("bearer ") {
        return true;
    }
    // Compact JWS: header.payload.signature
    raw.matches('.').count() == 2 && raw.len() > 40 && !raw.contains(' ')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sensitive_keys_match_case_insensitively() {
        assert!(is_sensitive_key("access_token"));
        assert!(is_sensitive_key("refreshToken"));
        assert!(is_sensitive_key("credentials.passcode"));
        assert!(is_sensitive_key("Authorization"));
        assert!(!is_sensitive_key("username"));
        assert!(!is_sensitive_key("step_type"));
    }

    #[test]
    fn redacts_sensitive_keys() {
        assert_eq!(
            sanitize_value("password", &json!("secret1")),
            json!(REDACTED)
        );
    }

    #[test]
    fn redacts_bearer_values_under_innocent_keys() {
        assert_eq!(
            sanitize_value("header", &json!("Bearer abc.def")),
            json!(REDACTED)
        );
    }

    #[test]
    fn redacts_nested_objects() {
        let value = json!({ "user": "alice", "refresh_token": "r1" });
        assert_eq!(
            sanitize_value("body", &value),
            json!({ "user": "alice", "refresh_token": REDACTED })
        );
    }

    #[test]
    fn keeps_plain_values() {
        assert_eq!(
            sanitize_value("message", &json!("Invalid code")),
            json!("Invalid code")
        );
        assert_eq!(sanitize_value("status", &json!(200)), json!(200));
    }
}
