//! Session Gate Middleware
//!
//! Axum middleware deciding, before routing, whether a request may reach its
//! target or is rewritten to the login page.

use axum::{
    extract::{OriginalUri, Request, State},
    http::{StatusCode, Uri, uri::InvalidUri, uri::PathAndQuery},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{
    jwt::ClaimDecoder,
    models::UserClaims,
    protected::ProtectedRoutes,
    session::{CookieSession, CookieSettings, SessionStore},
};

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Forward unchanged; claims are present when the path was protected
    PassThrough(Option<UserClaims>),
    /// Forward with the target rewritten to the login path
    RedirectToLogin,
}

/// Target of a request the gate rewrote to the login page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectedFrom(pub Uri);

/// Session gate state: route matcher, claim decoder and the login target.
pub struct SessionGate {
    routes: ProtectedRoutes,
    decoder: ClaimDecoder,
    cookies: CookieSettings,
    login: PathAndQuery,
}

impl SessionGate {
    pub fn new(
        routes: ProtectedRoutes,
        decoder: ClaimDecoder,
        cookies: CookieSettings,
        login_path: &str,
    ) -> Result<Self, InvalidUri> {
        Ok(Self {
            routes,
            decoder,
            cookies,
            login: login_path.parse()?,
        })
    }

    /// Decide the fate of a request to `path` carrying `session`.
    ///
    /// Unprotected paths never touch the session. Every token failure is
    /// treated as an absent session.
    pub fn decide<S: SessionStore + ?Sized>(&self, path: &str, session: &S) -> GateDecision {
        if !self.routes.requires_auth(path) {
            return GateDecision::PassThrough(None);
        }

        let Some(token) = session.get() else {
            tracing::debug!(path, "[SessionGate] no session token, redirecting to login");
            return GateDecision::RedirectToLogin;
        };

        match self.decoder.claims(&token) {
            Ok(claims) if !claims.is_empty() => GateDecision::PassThrough(Some(claims)),
            Ok(_) => {
                tracing::debug!(path, "[SessionGate] token carries no user id, redirecting to login");
                GateDecision::RedirectToLogin
            }
            Err(e) => {
                tracing::debug!(path, reason = %e, "[SessionGate] rejected session token, redirecting to login");
                GateDecision::RedirectToLogin
            }
        }
    }

    /// Middleware function; must wrap the router so the rewritten path is the one routed
    pub async fn guard(State(gate): State<Arc<SessionGate>>, mut req: Request, next: Next) -> Response {
        let session = CookieSession::from_headers(req.headers(), gate.cookies.clone());

        match gate.decide(req.uri().path(), &session) {
            GateDecision::PassThrough(Some(claims)) => {
                tracing::debug!(user_id = %claims.id, path = %req.uri().path(), "[SessionGate] session accepted");
                req.extensions_mut().insert(claims);
            }
            GateDecision::PassThrough(None) => {}
            GateDecision::RedirectToLogin => {
                let original = req.uri().clone();
                *req.uri_mut() = gate.rewrite(&original);
                req.extensions_mut().insert(RedirectedFrom(original.clone()));
                req.extensions_mut().insert(OriginalUri(original));
            }
        }

        next.run(req).await
    }

    fn rewrite(&self, uri: &Uri) -> Uri {
        let mut parts = uri.clone().into_parts();
        parts.path_and_query = Some(self.login.clone());
        Uri::from_parts(parts).unwrap_or_else(|_| Uri::from(self.login.clone()))
    }
}

/// Extension trait for extracting session claims from request
pub trait RequestAuthExt {
    fn claims(&self) -> Option<&UserClaims>;
    fn require_auth(&self) -> Result<&UserClaims, StatusCode>;
}

impl RequestAuthExt for Request {
    fn claims(&self) -> Option<&UserClaims> {
        self.extensions().get::<UserClaims>()
    }

    fn require_auth(&self) -> Result<&UserClaims, StatusCode> {
        self.claims().ok_or(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_tokens;
    use crate::auth::protected::MatchPolicy;
    use crate::auth::session::MemorySession;
    use axum::{Router, body::Body, routing::get};
    use serde_json::json;
    use tower::{Layer, ServiceExt};

    fn gate() -> SessionGate {
        SessionGate::new(
            ProtectedRoutes::new(["/settings", "/boards"], MatchPolicy::Substring),
            ClaimDecoder::new(Some(test_tokens::SECRET)),
            CookieSettings::new("access_token", true),
            "/login",
        )
        .unwrap()
    }

    #[test]
    fn unprotected_paths_pass_without_session() {
        let gate = gate();
        let no_session = MemorySession::default();
        assert_eq!(gate.decide("/login", &no_session), GateDecision::PassThrough(None));
        assert_eq!(gate.decide("/registration", &no_session), GateDecision::PassThrough(None));
    }

    #[test]
    fn unprotected_paths_skip_decoding() {
        let gate = gate();
        let garbage = MemorySession::with_token("garbage");
        assert_eq!(gate.decide("/login", &garbage), GateDecision::PassThrough(None));
    }

    #[test]
    fn protected_paths_without_session_redirect() {
        let gate = gate();
        for path in ["/settings", "/en/settings", "/boards/1"] {
            assert_eq!(
                gate.decide(path, &MemorySession::default()),
                GateDecision::RedirectToLogin,
                "{path}"
            );
        }
    }

    #[test]
    fn protected_paths_with_bad_tokens_redirect() {
        let gate = gate();
        let forged = test_tokens::signed_with(&test_tokens::claims_json(9_999_999_999), "nope");
        let mut no_id = test_tokens::claims_json(9_999_999_999);
        no_id["id"] = json!("");

        for token in [
            "garbage".to_string(),
            "a.b.c".to_string(),
            test_tokens::expired(),
            forged,
            test_tokens::signed_with(&no_id, test_tokens::SECRET),
        ] {
            assert_eq!(
                gate.decide("/settings", &MemorySession::with_token(token.clone())),
                GateDecision::RedirectToLogin,
                "{token}"
            );
        }
    }

    #[test]
    fn protected_paths_with_valid_session_pass_with_claims() {
        let gate = gate();
        let session = MemorySession::with_token(test_tokens::signed());
        match gate.decide("/settings", &session) {
            GateDecision::PassThrough(Some(claims)) => assert_eq!(claims.username, "ada"),
            other => panic!("expected pass-through with claims, got {other:?}"),
        }
    }

    async fn run(gate: SessionGate, request: Request) -> Response {
        let router = Router::new()
            .route(
                "/login",
                get(|uri: Uri, from: Option<axum::Extension<RedirectedFrom>>| async move {
                    match from {
                        Some(axum::Extension(RedirectedFrom(original))) => format!("login {uri} from {original}"),
                        None => format!("login {uri}"),
                    }
                }),
            )
            .route(
                "/settings",
                get(|req: Request| async move {
                    match req.claims() {
                        Some(claims) => format!("settings {}", claims.username),
                        None => "settings anonymous".to_string(),
                    }
                }),
            );
        let app = axum::middleware::from_fn_with_state(Arc::new(gate), SessionGate::guard)
            .layer(router);
        app.oneshot(request).await.unwrap()
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn redirect_rewrites_target_inside_pipeline() {
        let request = Request::builder()
            .uri("/settings?tab=profile")
            .body(Body::empty())
            .unwrap();
        let response = run(gate(), request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, "login /login from /settings?tab=profile");
    }

    #[tokio::test]
    async fn valid_cookie_reaches_protected_handler_with_claims() {
        let request = Request::builder()
            .uri("/settings")
            .header("cookie", format!("access_token={}", test_tokens::signed()))
            .body(Body::empty())
            .unwrap();

        let response = run(gate(), request).await;
        assert_eq!(body_of(response).await, "settings ada");
    }
}
