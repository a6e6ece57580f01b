//! # Kanban Web
//!
//! Web front of the kanban application, built with Rust, Axum and Tokio.
//!
//! ## Features
//! - Session gate: protected pages are only served to callers holding a valid
//!   session cookie, everybody else is shown the login page
//! - Typed API client for the kanban API with bearer token attachment and a
//!   uniform response envelope
//! - Login, registration and logout form handling
//! - Locale-prefixed routes (`/en/settings`, `/ru/settings`)
//! - Structured logging with tracing
//!
//! ## Architecture
//! - `server`: pipeline assembly and startup
//! - `config`: environment variable configuration
//! - `auth`: token decoding, protected route matching, session cookie, gate middleware
//! - `api`: outbound API client and identity service calls
//! - `forms`: API failures mapped onto form errors
//! - `routes`: HTTP handlers and locale resolution
//!
//! ## Environment Setup
//! Configuration is read from the environment and from a `.env` file when present:
//! ```bash
//! API_URL=http://localhost:8080
//! JWT_SECRET=...          # enables signature verification
//! APP_ENV=development     # session cookie without the Secure flag
//! ```
//!
//! ## Health Check
//! ```bash
//! curl http://localhost:3000/ping
//! ```

mod api;
mod auth;
mod config;
mod forms;
mod routes;
mod server;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Application entry point.
///
/// Loads `.env`, initializes tracing (`RUST_LOG`, default `info`), reads the
/// configuration and runs the HTTP server until the process is terminated.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may be set by other means
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting kanban web...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!("🏗️  Build profile: {}", if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    });

    let config = Config::from_env()?;

    tracing::info!("🌐 Locales: {} (default {})", config.locales.join(", "), config.default_locale());
    if config.session.jwt_secret.is_none() {
        tracing::warn!(
            "JWT_SECRET is not set: session token signatures are not verified, only their structure and expiry"
        );
    }
    if !config.session.secure_cookies {
        tracing::warn!("APP_ENV=development: session cookie is sent without the Secure flag");
    }

    server::start(config).await
}
