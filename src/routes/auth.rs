//! Auth routes for registration, login, token refresh and logout
//!
//! Each submission calls the identity service through the API client and maps
//! the envelope onto form errors. Session cookie changes travel back with the
//! response through the cookie jar.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::api::client::ClientError;
use crate::api::envelope::ApiResponse;
use crate::auth::models::{LoginRequest, RegistrationData};
use crate::auth::session::CookieSession;
use crate::forms::{FormErrors, FormReply, LOGIN_FIELDS, REGISTRATION_FIELDS};
use crate::server::AppState;

const UNAVAILABLE: &str = "Service is temporarily unavailable, please try again later";

pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/registration", post(register))
        .route("/refresh-access", post(refresh_access))
        .route("/logout", post(logout))
}

/// Sign in; on success the session cookie is set and the browser is sent home.
///
/// Without `remember` the session cookie is dropped when the browser closes.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<LoginRequest>,
) -> Response {
    let mut session = CookieSession::new(jar, state.cookies.clone()).persistent(credentials.remember);

    match state.api.login(&mut session, &credentials).await {
        Ok(ApiResponse::Ok { .. }) => {
            (session.into_jar(), Redirect::to(&state.config.routes.home_path)).into_response()
        }
        Ok(ApiResponse::Err(failure)) => (
            failure.status,
            Json(FormReply::failed(FormErrors::from_failure(&failure, LOGIN_FIELDS))),
        )
            .into_response(),
        Err(e) => unavailable("login", e),
    }
}

/// Create an account. The issued token is not stored; the user signs in afterwards.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(data): Json<RegistrationData>,
) -> Response {
    let session = CookieSession::new(jar, state.cookies.clone());

    match state.api.registration(&session, &data).await {
        Ok(ApiResponse::Ok { .. }) => {
            tracing::info!(username = %data.username, "Registration accepted");
            (StatusCode::CREATED, Json(FormReply::success())).into_response()
        }
        Ok(ApiResponse::Err(failure)) => (
            failure.status,
            Json(FormReply::failed(FormErrors::from_failure(&failure, REGISTRATION_FIELDS))),
        )
            .into_response(),
        Err(e) => unavailable("registration", e),
    }
}

/// Swap the session's access token for a fresh one using the relayed refresh token.
pub async fn refresh_access(State(state): State<AppState>, jar: CookieJar) -> Response {
    // Refreshed sessions end with the browser, like the refresh cookie itself.
    let mut session = CookieSession::new(jar, state.cookies.clone()).persistent(false);

    match state.api.refresh_access(&mut session).await {
        Ok(ApiResponse::Ok { .. }) => (session.into_jar(), Json(FormReply::success())).into_response(),
        Ok(ApiResponse::Err(failure)) => (
            failure.status,
            Json(FormReply::failed(FormErrors::root(failure.message))),
        )
            .into_response(),
        Err(e) => unavailable("refresh", e),
    }
}

/// Sign out; the session cookie is removed once the identity service confirms.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut session = CookieSession::new(jar, state.cookies.clone());

    match state.api.logout(&mut session).await {
        Ok(ApiResponse::Ok { .. }) => {
            (session.into_jar(), Redirect::to(&state.config.routes.login_path)).into_response()
        }
        Ok(ApiResponse::Err(failure)) => (
            failure.status,
            Json(FormReply::failed(FormErrors::root(failure.message))),
        )
            .into_response(),
        Err(e) => unavailable("logout", e),
    }
}

fn unavailable(action: &str, e: ClientError) -> Response {
    error!(action, error = %e, "Identity service call failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(FormReply::failed(FormErrors::root(UNAVAILABLE))),
    )
        .into_response()
}
