//! Query string cleaning and encoding.

use std::collections::BTreeMap;

use serde_json::Value;

/// Query parameters as handed to the API client; values may be null.
pub type Query = BTreeMap<String, Value>;

/// Encode `query` as `application/x-www-form-urlencoded`, dropping keys whose
/// value is null or the empty string. Returns an empty string when nothing is left.
pub fn encode(query: &Query) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());

    for (key, value) in query {
        match value {
            Value::Null => {}
            Value::String(s) if s.is_empty() => {}
            Value::String(s) => {
                serializer.append_pair(key, s);
            }
            other => {
                serializer.append_pair(key, &other.to_string());
            }
        }
    }

    serializer.finish()
}
