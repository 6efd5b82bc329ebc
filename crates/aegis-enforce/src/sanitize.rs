//! Payload sanitization.
//!
//! Executors may hand payloads to dynamic hosts where object keys can
//! poison a structural prototype chain. The kernel strips those keys from
//! key-value payloads, at every nesting depth, before the executor sees
//! them. Scalar payloads pass through untouched.

use serde_json::Value;

/// Keys that can poison a prototype chain on a dynamic host.
const BLOCKED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Return a copy of `payload` with blocked keys stripped.
///
/// Objects are filtered recursively and arrays are descended; everything
/// else is returned as-is.
pub fn sanitize_payload(payload: &Value) -> Value {
    match payload {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !BLOCKED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), sanitize_payload(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_payload).collect()),
        scalar => scalar.clone(),
    }
}
