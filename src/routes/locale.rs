//! Locale resolution
//!
//! Runs after the session gate and before routing: strips a supported locale
//! prefix (`/en/settings` becomes `/settings`) and records the locale for the
//! page handlers.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::{Uri, uri::PathAndQuery},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

/// Locale of the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Locale(pub String);

#[derive(Debug, Clone)]
pub struct Locales {
    supported: Vec<String>,
    default: String,
}

impl Locales {
    /// First entry is the default; `None` when `supported` is empty.
    pub fn new(supported: Vec<String>) -> Option<Self> {
        let default = supported.first()?.clone();
        Some(Self { supported, default })
    }

    /// Split a leading locale segment off `path`.
    ///
    /// Returns the resolved locale and the remaining path when a prefix was found.
    pub fn split<'a>(&self, path: &'a str) -> (Locale, Option<&'a str>) {
        let rest = path.strip_prefix('/').unwrap_or(path);
        let (first, remainder) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };

        if self.supported.iter().any(|l| l == first) {
            (Locale(first.to_string()), Some(remainder))
        } else {
            (Locale(self.default.clone()), None)
        }
    }

    pub async fn resolve(State(locales): State<Arc<Locales>>, mut req: Request, next: Next) -> Response {
        let (locale, stripped) = locales.split(req.uri().path());

        if let Some(path) = stripped {
            let rewritten = strip_path(req.uri(), path);
            if req.extensions().get::<OriginalUri>().is_none() {
                let original = req.uri().clone();
                req.extensions_mut().insert(OriginalUri(original));
            }
            if let Some(uri) = rewritten {
                *req.uri_mut() = uri;
            }
        }

        tracing::debug!(locale = %locale.0, path = %req.uri().path(), "[Locale] resolved");
        req.extensions_mut().insert(locale);
        next.run(req).await
    }
}

fn strip_path(uri: &Uri, path: &str) -> Option<Uri> {
    let path_and_query: PathAndQuery = match uri.query() {
        Some(query) => format!("{path}?{query}").parse().ok()?,
        None => path.parse().ok()?,
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).ok()
}
