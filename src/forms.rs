//! Form error mapping
//!
//! Turns an API failure into the per-field and form-level (`root`) messages a
//! submitted form displays.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::envelope::{ApiFailure, ROOT_FIELD};

/// Fields of the login form that surface API errors
pub const LOGIN_FIELDS: &[&str] = &[ROOT_FIELD];

/// Fields of the registration form that surface API errors
pub const REGISTRATION_FIELDS: &[&str] = &["email", "username", ROOT_FIELD];

/// Messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    /// Keep the failure's messages for `fields` only.
    ///
    /// A failure that maps onto none of them is shown as a form-level message
    /// so the submission never fails silently.
    pub fn from_failure(failure: &ApiFailure, fields: &[&str]) -> Self {
        let mut errors: BTreeMap<String, String> = fields
            .iter()
            .filter_map(|&name| failure.field(name).map(|msg| (name.to_string(), msg.to_string())))
            .collect();

        if errors.is_empty() {
            errors.insert(ROOT_FIELD.to_string(), failure.message.clone());
        }

        Self(errors)
    }

    pub fn root(message: impl Into<String>) -> Self {
        Self(BTreeMap::from([(ROOT_FIELD.to_string(), message.into())]))
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// JSON reply to a form submission
#[derive(Debug, Clone, Serialize)]
pub struct FormReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "FormErrors::is_empty")]
    pub errors: FormErrors,
}

impl FormReply {
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: FormErrors::default(),
        }
    }

    pub fn failed(errors: FormErrors) -> Self {
        Self { ok: false, errors }
    }
}
