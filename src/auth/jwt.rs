//! Session Token Decoding
//!
//! Structural JWT decoding into [`UserClaims`], with optional HS256 signature
//! verification and an expiry check layered on top.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::models::UserClaims;

/// Clock skew tolerance applied to `exp` (60 seconds).
const CLOCK_SKEW_LEEWAY: i64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

#[derive(Deserialize)]
struct ExpiryClaim {
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode a token into claims without contacting anything and without
/// checking the signature.
///
/// The token must be three dot-separated base64url segments whose header and
/// payload are JSON objects, and the payload must carry every claim field.
pub fn decode(token: &str) -> Result<UserClaims, TokenError> {
    decode_payload(token)
}

/// Read only the `exp` claim of a structurally valid token.
pub fn expires_at(token: &str) -> Option<i64> {
    decode_payload::<ExpiryClaim>(token).ok().and_then(|c| c.exp)
}

fn decode_payload<T: DeserializeOwned>(token: &str) -> Result<T, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, _signature] = segments.as_slice() else {
        return Err(TokenError::Malformed(format!(
            "expected 3 segments, got {}",
            segments.len()
        )));
    };

    let header = decode_segment(header, "header")?;
    if !header.is_object() {
        return Err(TokenError::Malformed("header is not a JSON object".into()));
    }

    let payload = decode_segment(payload, "payload")?;
    if !payload.is_object() {
        return Err(TokenError::Malformed("payload is not a JSON object".into()));
    }

    serde_json::from_value(payload).map_err(|e| TokenError::Malformed(format!("claims: {e}")))
}

fn decode_segment(segment: &str, name: &str) -> Result<Value, TokenError> {
    // Some issuers keep the base64 padding; the URL-safe alphabet never contains '='.
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| TokenError::Malformed(format!("{name}: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(format!("{name}: {e}")))
}

/// Turns session tokens into claims for the session gate.
///
/// Without a secret only structure and expiry are checked; the identity
/// service's signature is trusted blindly.
#[derive(Clone)]
pub struct ClaimDecoder {
    verification: Option<(DecodingKey, Validation)>,
}

impl ClaimDecoder {
    /// Create a decoder, verifying HS256 signatures when `secret` is provided
    pub fn new(secret: Option<&str>) -> Self {
        let verification = secret.map(|secret| {
            let mut validation = Validation::new(Algorithm::HS256);
            // Expiry is checked in `claims` with its own leeway.
            validation.validate_exp = false;
            validation.validate_aud = false;
            validation.required_spec_claims.clear();
            (DecodingKey::from_secret(secret.as_bytes()), validation)
        });

        Self { verification }
    }

    pub fn verifies_signatures(&self) -> bool {
        self.verification.is_some()
    }

    /// Check the token signature against the configured secret; a no-op without one
    pub fn verify(&self, token: &str) -> Result<(), TokenError> {
        let Some((key, validation)) = &self.verification else {
            return Ok(());
        };

        jsonwebtoken::decode::<Value>(token, key, validation)
            .map(|_| ())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
                other => TokenError::Malformed(format!("{other:?}")),
            })
    }

    /// Decode, verify and expiry-check a token
    pub fn claims(&self, token: &str) -> Result<UserClaims, TokenError> {
        let claims = decode(token)?;
        self.verify(token)?;

        if let Some(exp) = claims.exp {
            // `exp` is caller-controlled; saturate instead of overflowing.
            if exp.saturating_add(CLOCK_SKEW_LEEWAY) < Utc::now().timestamp() {
                return Err(TokenError::Expired);
            }
        }

        Ok(claims)
    }
}
