//! Authentication Models
//!
//! Data structures for decoded session claims and authentication payloads.

use serde::{Deserialize, Serialize};

/// User identity carried inside a session token.
///
/// Every field except `exp` must be present for a token to decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserClaims {
    pub id: String,
    pub email: String,
    pub avatar: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Expiration timestamp (seconds since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl UserClaims {
    /// Claims without a user id identify nobody
    pub fn is_empty(&self) -> bool {
        self.id.trim().is_empty()
    }
}

/// Login form payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
    #[serde(default, skip_serializing)]
    pub remember: bool,
}

/// Registration payload as sent to the identity service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationData {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}
