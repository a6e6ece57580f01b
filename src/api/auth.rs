//! Identity service calls.
//!
//! Login and refresh persist the issued access token in the session; logout
//! clears it. Registration returns the token without storing it.
//!
//! The identity service also hands out a `refresh_token` cookie on login and
//! demands it back on refresh. The session keeps it alongside the access
//! token and it is forwarded as a `Cookie` header.

use axum_extra::extract::cookie::Cookie;
use reqwest::{
    Method, StatusCode,
    header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE},
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::client::{ApiClient, ClientError, RequestOptions};
use crate::api::envelope::{ApiFailure, ApiResponse};
use crate::auth::models::{LoginRequest, RegistrationData};
use crate::auth::session::{REFRESH_COOKIE, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiPath {
    Registration,
    Login,
    RefreshAccess,
    Logout,
}

impl ApiPath {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "/registration",
            Self::Login => "/login",
            Self::RefreshAccess => "/refresh-access",
            Self::Logout => "/logout",
        }
    }
}

impl ApiClient {
    pub async fn registration<S>(&self, session: &S, data: &RegistrationData) -> Result<ApiResponse<String>, ClientError>
    where
        S: SessionStore + ?Sized,
    {
        let body = serde_json::to_value(data)?;
        self.post(session, ApiPath::Registration.as_str(), RequestOptions::json(body))
            .await
    }

    /// Exchange credentials for an access token and store it in `session`
    pub async fn login<S>(&self, session: &mut S, credentials: &LoginRequest) -> Result<ApiResponse<String>, ClientError>
    where
        S: SessionStore + ?Sized,
    {
        let body = serde_json::to_value(credentials)?;
        let (response, headers): (ApiResponse<String>, _) = self
            .exchange(Method::POST, &*session, ApiPath::Login.as_str(), RequestOptions::json(body))
            .await?;

        if let ApiResponse::Ok { data: token } = &response {
            session.set(token);
            relay_refresh_token(session, &headers);
            info!(identifier = %credentials.identifier, remember = credentials.remember, "[ApiClient] login succeeded, session stored");
        }

        Ok(response)
    }

    /// Trade the current access token for a fresh one.
    ///
    /// Needs the refresh token relayed at login; without it no call is made
    /// and a 401 failure is returned.
    pub async fn refresh_access<S>(&self, session: &mut S) -> Result<ApiResponse<String>, ClientError>
    where
        S: SessionStore + ?Sized,
    {
        let path = ApiPath::RefreshAccess.as_str();
        let Some(refresh) = session.refresh_token() else {
            warn!("[ApiClient] refresh skipped, no refresh token in session");
            let body = json!({ "message": "no refresh token" });
            return Ok(ApiResponse::Err(ApiFailure::from_body(StatusCode::UNAUTHORIZED, path, body)));
        };

        let current = session.get().unwrap_or_default();
        let mut options = RequestOptions::json(json!(current));
        options
            .headers
            .insert(COOKIE, HeaderValue::from_str(&format!("{REFRESH_COOKIE}={refresh}"))?);

        let (response, headers): (ApiResponse<String>, _) =
            self.exchange(Method::POST, &*session, path, options).await?;

        if let ApiResponse::Ok { data: token } = &response {
            session.set(token);
            relay_refresh_token(session, &headers);
            debug!("[ApiClient] access token refreshed");
        }

        Ok(response)
    }

    pub async fn logout<S>(&self, session: &mut S) -> Result<ApiResponse<serde_json::Value>, ClientError>
    where
        S: SessionStore + ?Sized,
    {
        let response: ApiResponse<serde_json::Value> = self
            .post(&*session, ApiPath::Logout.as_str(), RequestOptions::default())
            .await?;

        if response.is_ok() {
            session.clear();
        }

        Ok(response)
    }
}

/// Copy a `refresh_token` set by the identity service into the session
fn relay_refresh_token<S>(session: &mut S, headers: &HeaderMap)
where
    S: SessionStore + ?Sized,
{
    let refresh = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_string()).ok())
        .find(|cookie| cookie.name() == REFRESH_COOKIE);

    if let Some(cookie) = refresh {
        session.set_refresh_token(cookie.value());
    }
}
