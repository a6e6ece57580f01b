//! API Response Envelope
//!
//! Every outward call ends in an [`ApiResponse`]: the decoded payload on
//! success, or a structured [`ApiFailure`] for a non-success status.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

/// Field key carrying the form-level (non-field) message.
pub const ROOT_FIELD: &str = "root";

/// Failure branch of the envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub message: String,
    /// Form field name to validation message
    pub fields: BTreeMap<String, String>,
    /// Parsed error body as received
    pub body: Value,
}

impl ApiFailure {
    /// Build a failure from a parsed error body.
    ///
    /// Bodies shaped like `{message, fields}` are unpacked; anything else is
    /// kept only as `body` and described by a generic message.
    pub fn from_body(status: StatusCode, path: &str, body: Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Failed to fetch {path}: {status}"));

        let fields = body
            .get("fields")
            .and_then(Value::as_object)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|(name, msg)| msg.as_str().map(|m| (name.clone(), m.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            status,
            message,
            fields,
            body,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Form-level message, `fields.root`
    pub fn root(&self) -> Option<&str> {
        self.field(ROOT_FIELD)
    }
}

impl Serialize for ApiFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiFailure", 2)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("fields", &self.fields)?;
        state.end()
    }
}

/// Discriminated result of an API call.
///
/// Serializes as `{"ok": true, "data": ...}` or `{"ok": false, "error": {"message", "fields"}}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Ok { data: T },
    Err(ApiFailure),
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ok { data } => Some(data),
            Self::Err(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Ok { .. } => None,
            Self::Err(failure) => Some(failure),
        }
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiResponse", 2)?;
        match self {
            Self::Ok { data } => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("data", data)?;
            }
            Self::Err(failure) => {
                state.serialize_field("ok", &false)?;
                state.serialize_field("error", failure)?;
            }
        }
        state.end()
    }
}
