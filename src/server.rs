//! # Server Module
//!
//! HTTP server setup and route configuration for the kanban web front.
//!
//! The session gate and locale resolution wrap the router rather than being
//! layered onto it, so a request rewritten to the login page is routed to the
//! login page.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    middleware,
    response::Response,
    routing::get,
};
use tokio::net::TcpListener;
use tower::{Service, ServiceBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::client::ApiClient;
use crate::auth::{
    jwt::ClaimDecoder,
    middleware::SessionGate,
    protected::ProtectedRoutes,
    session::CookieSettings,
};
use crate::config::Config;
use crate::routes::{self, health::ping, locale::Locales};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<ApiClient>,
    pub cookies: CookieSettings,
}

/// Build the complete request pipeline: session gate, locale resolution, router.
pub fn app(
    config: Config,
) -> Result<impl Service<Request, Response = Response, Error = Infallible, Future: Send> + Clone + Send + 'static> {
    let cookies = CookieSettings::new(config.session.cookie_name.clone(), config.session.secure_cookies);

    let protected = ProtectedRoutes::new(config.routes.protected.clone(), config.routes.match_policy)
        .with_locales(config.locales.clone());
    let decoder = ClaimDecoder::new(config.session.jwt_secret.as_deref());
    tracing::info!(
        policy = %protected.policy(),
        patterns = ?protected.patterns(),
        verifies_signatures = decoder.verifies_signatures(),
        "Session gate configured"
    );
    let gate = SessionGate::new(protected, decoder, cookies.clone(), &config.routes.login_path)
        .with_context(|| format!("LOGIN_PATH '{}' is not a valid path", config.routes.login_path))?;

    let locales = Locales::new(config.locales.clone())
        .ok_or_else(|| anyhow!("at least one supported locale is required"))?;

    let api = ApiClient::new(config.api.base_url.clone(), Duration::from_secs(config.api.timeout_secs))
        .context("Failed to create API client")?;

    let cors = cors_layer(&config.cors_origins)?;

    let state = AppState {
        config: Arc::new(config),
        api: Arc::new(api),
        cookies,
    };

    let mut router = Router::new()
        .route("/ping", get(ping)) // Health check endpoint
        .merge(routes::pages::create_page_routes())
        .merge(routes::auth::create_auth_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors {
        router = router.layer(cors);
    }

    Ok(ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(Arc::new(gate), SessionGate::guard))
        .layer(middleware::from_fn_with_state(Arc::new(locales), Locales::resolve))
        .service(router))
}

fn cors_layer(origins: &[String]) -> Result<Option<CorsLayer>> {
    if origins.is_empty() {
        return Ok(None);
    }

    let origins = origins
        .iter()
        .map(|o| o.parse::<HeaderValue>().with_context(|| format!("invalid CORS origin '{o}'")))
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::ORIGIN,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::AUTHORIZATION,
            ])
            .allow_credentials(true), // Allow cookies for auth
    ))
}

/// Starts the HTTP server and serves until the process is terminated.
pub async fn start(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let api_url = config.api.base_url.clone();

    let app = app(config)?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("🚀 Kanban web starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("🔗 API origin: {}", api_url);

    axum::serve(listener, axum::ServiceExt::<Request>::into_make_service(app))
        .await
        .context("Server error")?;

    Ok(())
}
