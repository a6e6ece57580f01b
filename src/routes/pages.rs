//! Page routes
//!
//! Pages are rendered as small JSON documents describing what the page shows.

use axum::{
    Extension, Json, Router,
    extract::Request,
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};

use crate::auth::middleware::{RedirectedFrom, RequestAuthExt};
use crate::routes::locale::Locale;
use crate::server::AppState;

pub fn create_page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page))
        .route("/registration", get(registration_page))
        .route("/settings", get(settings))
}

/// Home page; greets the signed-in user when the gate attached claims.
pub async fn home(Extension(locale): Extension<Locale>, req: Request) -> Json<Value> {
    Json(json!({
        "page": "home",
        "locale": locale,
        "user": req.claims(),
    }))
}

/// Login page. Requests the gate bounced here carry the page they were after.
pub async fn login_page(
    Extension(locale): Extension<Locale>,
    redirected: Option<Extension<RedirectedFrom>>,
) -> Json<Value> {
    let from = redirected.map(|Extension(RedirectedFrom(uri))| uri.to_string());
    Json(json!({
        "page": "login",
        "locale": locale,
        "from": from,
    }))
}

pub async fn registration_page(Extension(locale): Extension<Locale>) -> Json<Value> {
    Json(json!({
        "page": "registration",
        "locale": locale,
    }))
}

/// Account settings (protected)
pub async fn settings(Extension(locale): Extension<Locale>, req: Request) -> Result<Json<Value>, StatusCode> {
    let user = req.require_auth()?;
    Ok(Json(json!({
        "page": "settings",
        "locale": locale,
        "user": user,
    })))
}
