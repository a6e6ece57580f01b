//! Session Token Persistence
//!
//! The session token lives in an HttpOnly cookie, next to the refresh token
//! relayed from the identity service. A [`CookieSession`] wraps the cookie
//! jar of one request/response cycle and is passed explicitly to the session
//! gate and the API client.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use crate::auth::jwt;

/// Read/write access to the session token of the current request.
pub trait SessionStore: Send + Sync {
    /// Current token, `None` when absent or empty
    fn get(&self) -> Option<String>;

    /// Replace the token wholesale
    fn set(&mut self, token: &str);

    /// Forget the access and refresh tokens (logout)
    fn clear(&mut self);

    /// Refresh token relayed from the identity service, `None` when absent or empty
    fn refresh_token(&self) -> Option<String>;

    /// Replace the refresh token; an empty value removes it
    fn set_refresh_token(&mut self, token: &str);
}

/// Cookie the identity service keeps its refresh token in
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub refresh_name: String,
    /// Only send the cookie over TLS
    pub secure: bool,
}

impl CookieSettings {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            refresh_name: REFRESH_COOKIE.to_string(),
            secure,
        }
    }

    /// Build the session cookie.
    ///
    /// A persistent cookie expires together with the token when it carries
    /// `exp`; otherwise the cookie lives until the browser closes.
    pub fn session_cookie(&self, token: &str, persistent: bool) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.name.clone(), token.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .build();

        if let Some(exp) = jwt::expires_at(token).filter(|_| persistent) {
            let max_age = exp.saturating_sub(Utc::now().timestamp());
            if max_age > 0 {
                cookie.set_max_age(time::Duration::seconds(max_age));
            }
        }

        cookie
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        removal(self.name.clone(), self.secure)
    }

    /// Refresh token cookie, attributes as the identity service sets them
    pub fn refresh_cookie(&self, token: &str) -> Cookie<'static> {
        if token.is_empty() {
            return removal(self.refresh_name.clone(), self.secure);
        }

        Cookie::build((self.refresh_name.clone(), token.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .build()
    }
}

fn removal(name: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Cookie-backed session for one request/response cycle.
///
/// Read from the inbound `Cookie` header; hand [`into_jar`](Self::into_jar)
/// back with the response so writes reach the browser as `Set-Cookie`.
#[derive(Debug, Clone)]
pub struct CookieSession {
    jar: CookieJar,
    settings: CookieSettings,
    persistent: bool,
}

impl CookieSession {
    pub fn new(jar: CookieJar, settings: CookieSettings) -> Self {
        Self {
            jar,
            settings,
            persistent: true,
        }
    }

    /// Whether a stored token outlives the browser session ("remember me")
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn from_headers(headers: &HeaderMap, settings: CookieSettings) -> Self {
        Self::new(CookieJar::from_headers(headers), settings)
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl SessionStore for CookieSession {
    fn get(&self) -> Option<String> {
        self.jar
            .get(&self.settings.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn set(&mut self, token: &str) {
        let cookie = self.settings.session_cookie(token, self.persistent);
        self.jar = self.jar.clone().add(cookie);
    }

    fn clear(&mut self) {
        self.jar = self
            .jar
            .clone()
            .add(self.settings.removal_cookie())
            .add(self.settings.refresh_cookie(""));
    }

    fn refresh_token(&self) -> Option<String> {
        self.jar
            .get(&self.settings.refresh_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn set_refresh_token(&mut self, token: &str) {
        self.jar = self.jar.clone().add(self.settings.refresh_cookie(token));
    }
}

/// Session held in memory, for callers outside a request cycle
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    token: Option<String>,
    refresh: Option<String>,
}

#[cfg(test)]
impl MemorySession {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            refresh: None,
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh = Some(token.into());
        self
    }
}

#[cfg(test)]
impl SessionStore for MemorySession {
    fn get(&self) -> Option<String> {
        self.token.clone().filter(|t| !t.is_empty())
    }

    fn set(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn clear(&mut self) {
        self.token = None;
        self.refresh = None;
    }

    fn refresh_token(&self) -> Option<String> {
        self.refresh.clone().filter(|t| !t.is_empty())
    }

    fn set_refresh_token(&mut self, token: &str) {
        self.refresh = Some(token.to_string());
    }
}
