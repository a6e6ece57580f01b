//! Configuration module for environment variables and application settings

use std::env;
use std::str::FromStr;
use anyhow::{Result, anyhow};

use crate::auth::protected::MatchPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Remote API configuration
    pub api: ApiConfig,

    /// Session cookie and token configuration
    pub session: SessionConfig,

    /// Protected routes and navigation targets
    pub routes: RoutesConfig,

    /// Locales accepted as a path prefix, first one is the default
    pub locales: Vec<String>,

    /// Origins allowed by CORS; empty disables the CORS layer
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origin every relative API path is resolved against
    pub base_url: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Mark the session cookie `Secure` (production deployments)
    pub secure_cookies: bool,
    /// HS256 secret shared with the identity service; signatures are not checked without it
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RoutesConfig {
    pub protected: Vec<String>,
    pub match_policy: MatchPolicy,
    pub login_path: String,
    pub home_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_secs: 10,
            },
            session: SessionConfig {
                cookie_name: "access_token".to_string(),
                secure_cookies: true,
                jwt_secret: None,
            },
            routes: RoutesConfig {
                protected: vec!["/settings".to_string(), "/boards".to_string()],
                match_policy: MatchPolicy::Substring,
                login_path: "/login".to_string(),
                home_path: "/".to_string(),
            },
            locales: vec!["en".to_string(), "ru".to_string()],
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "production".to_string());

        let port = match env::var("PORT").or_else(|_| env::var("SERVER_PORT")) {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow!("PORT must be a valid port number, got '{raw}'"))?,
            Err(_) => defaults.server.port,
        };

        let base_url = env::var("API_URL").unwrap_or(defaults.api.base_url);
        url::Url::parse(&base_url).map_err(|e| anyhow!("API_URL is not a valid URL: {e}"))?;

        let match_policy = match env::var("ROUTE_MATCH") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.routes.match_policy,
        };

        let login_path = env::var("LOGIN_PATH").unwrap_or(defaults.routes.login_path);
        if !login_path.starts_with('/') {
            return Err(anyhow!("LOGIN_PATH must start with '/', got '{login_path}'"));
        }

        let locales = env::var("SUPPORTED_LOCALES")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.locales);
        if locales.is_empty() {
            return Err(anyhow!("SUPPORTED_LOCALES must name at least one locale"));
        }

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
            },
            api: ApiConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout_secs: parse_or("API_TIMEOUT_SECS", defaults.api.timeout_secs),
            },
            session: SessionConfig {
                cookie_name: env::var("SESSION_COOKIE_NAME")
                    .unwrap_or(defaults.session.cookie_name),
                secure_cookies: app_env != "development",
                jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            },
            routes: RoutesConfig {
                protected: env::var("PROTECTED_ROUTES")
                    .map(|raw| split_list(&raw))
                    .unwrap_or(defaults.routes.protected),
                match_policy,
                login_path,
                home_path: env::var("HOME_PATH").unwrap_or(defaults.routes.home_path),
            },
            locales,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        })
    }

    pub fn default_locale(&self) -> &str {
        self.locales.first().map(String::as_str).unwrap_or("en")
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
