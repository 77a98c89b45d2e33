//! Response body normalization.
//!
//! The API does not promise an object at the top level, so a body is turned
//! into a keyed [`Document`] in three tiers: an object is returned as is, an
//! array is wrapped under `"data"`, any other JSON value under `"value"`.
//! Text that is not JSON at all is unparseable.

use serde_json::{Map, Value};

/// Loosely typed keyed document handed to callers.
pub type Document = Map<String, Value>;

/// Key an array body is wrapped under.
pub const ARRAY_KEY: &str = "data";
/// Key a scalar body is wrapped under.
pub const SCALAR_KEY: &str = "value";

/// Three-tier normalization. `None` means the body is not JSON.
pub fn normalize_body(text: &str) -> Option<Document> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(map),
        array @ Value::Array(_) => Some(wrap(ARRAY_KEY, array)),
        scalar => Some(wrap(SCALAR_KEY, scalar)),
    }
}

/// Object form only; used for error bodies and by the multipart executor.
pub fn object_document(text: &str) -> Option<Document> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Object form, falling back to the array-wrapped form. Scalars give `None`.
pub fn object_or_array_document(text: &str) -> Option<Document> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(map),
        array @ Value::Array(_) => Some(wrap(ARRAY_KEY, array)),
        _ => None,
    }
}

fn wrap(key: &str, value: Value) -> Document {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}
