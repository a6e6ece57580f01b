//! Typed API Client
//!
//! Uniform wrapper around outbound calls to the kanban API: token attachment,
//! query cleaning, response decoding and error normalization.

use std::time::Duration;

use reqwest::{
    Client, Method,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue},
    multipart::Form,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::envelope::{ApiFailure, ApiResponse};
use crate::api::query::{self, Query};
use crate::auth::session::SessionStore;

/// Infrastructure faults; HTTP failure statuses are not errors (see [`ApiResponse::Err`]).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

/// Request body
pub enum RequestBody {
    Json(Value),
    /// Sent as `multipart/form-data`; the content type is left to reqwest
    Multipart(Form),
}

/// Per-call options.
#[derive(Default)]
pub struct RequestOptions {
    pub body: Option<RequestBody>,
    pub query: Option<Query>,
    pub headers: HeaderMap,
    /// `path` is a full URL and the configured origin is not prepended
    pub custom_origin: bool,
}

impl RequestOptions {
    pub fn json(body: Value) -> Self {
        Self {
            body: Some(RequestBody::Json(body)),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }
}

/// HTTP client bound to one API origin
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { http, base_url })
    }

    pub async fn get<T, S>(&self, session: &S, path: &str, options: RequestOptions) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
        S: SessionStore + ?Sized,
    {
        self.request(Method::GET, session, path, options).await
    }

    pub async fn post<T, S>(&self, session: &S, path: &str, options: RequestOptions) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
        S: SessionStore + ?Sized,
    {
        self.request(Method::POST, session, path, options).await
    }

    pub async fn patch<T, S>(&self, session: &S, path: &str, options: RequestOptions) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
        S: SessionStore + ?Sized,
    {
        self.request(Method::PATCH, session, path, options).await
    }

    pub async fn delete<T, S>(&self, session: &S, path: &str, options: RequestOptions) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
        S: SessionStore + ?Sized,
    {
        self.request(Method::DELETE, session, path, options).await
    }

    async fn request<T, S>(
        &self,
        method: Method,
        session: &S,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
        S: SessionStore + ?Sized,
    {
        let (response, _) = self.exchange(method, session, path, options).await?;
        Ok(response)
    }

    /// Send a request and return the decoded envelope with the response headers
    pub(crate) async fn exchange<T, S>(
        &self,
        method: Method,
        session: &S,
        path: &str,
        options: RequestOptions,
    ) -> Result<(ApiResponse<T>, HeaderMap), ClientError>
    where
        T: DeserializeOwned,
        S: SessionStore + ?Sized,
    {
        let RequestOptions {
            body,
            query,
            mut headers,
            custom_origin,
        } = options;

        let multipart = matches!(body, Some(RequestBody::Multipart(_)));
        if !multipart {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if let Some(token) = session.get() {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }

        let url = self.url(path, query.as_ref(), custom_origin);
        debug!(%method, %url, "[ApiClient] sending request");

        let mut builder = self.http.request(method, &url).headers(headers);
        builder = match body {
            Some(RequestBody::Json(value)) => builder.body(serde_json::to_vec(&value)?),
            Some(RequestBody::Multipart(form)) => builder.multipart(form),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        if !status.is_success() {
            let failure = ApiFailure::from_body(status, path, body);
            warn!(%status, path, message = %failure.message, "[ApiClient] request failed");
            return Ok((ApiResponse::Err(failure), response_headers));
        }

        let data = serde_json::from_value(body)?;
        Ok((ApiResponse::Ok { data }, response_headers))
    }

    fn url(&self, path: &str, query: Option<&Query>, custom_origin: bool) -> String {
        let mut url = if custom_origin {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        };

        if let Some(query) = query {
            let encoded = query::encode(query);
            if !encoded.is_empty() {
                url.push('?');
                url.push_str(&encoded);
            }
        }

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::MemorySession;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn attaches_bearer_token_and_json_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/boards"))
            .and(header("authorization", "Bearer abc.def.ghi"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "title": "Roadmap" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "b1" })))
            .expect(1)
            .mount(&server)
            .await;

        let session = MemorySession::with_token("abc.def.ghi");
        let response: ApiResponse<Value> = client(&server)
            .post(&session, "/boards", RequestOptions::json(json!({ "title": "Roadmap" })))
            .await
            .unwrap();

        assert_eq!(response.data(), Some(&json!({ "id": "b1" })));
    }

    #[tokio::test]
    async fn omits_authorization_without_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boards"))
            .respond_with(|req: &Request| {
                let authorized = req.headers.contains_key("authorization");
                ResponseTemplate::new(200).set_body_json(json!({ "authorized": authorized }))
            })
            .mount(&server)
            .await;

        let response: ApiResponse<Value> = client(&server)
            .get(&MemorySession::default(), "/boards", RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(response.data(), Some(&json!({ "authorized": false })));
    }

    #[tokio::test]
    async fn cleans_query_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("c", "x"))
            .respond_with(|req: &Request| {
                ResponseTemplate::new(200).set_body_json(json!(req.url.query().unwrap_or_default()))
            })
            .mount(&server)
            .await;

        let query: Query = serde_json::from_value(json!({ "a": "", "b": null, "c": "x" })).unwrap();
        let response: ApiResponse<String> = client(&server)
            .get(&MemorySession::default(), "/tasks", RequestOptions::default().with_query(query))
            .await
            .unwrap();

        assert_eq!(response.data().map(String::as_str), Some("c=x"));
    }

    #[tokio::test]
    async fn empty_body_decodes_as_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/boards/b1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response: ApiResponse<Option<Value>> = client(&server)
            .delete(&MemorySession::default(), "/boards/b1", RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(response, ApiResponse::Ok { data: None });
    }

    #[tokio::test]
    async fn failure_status_becomes_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "validation failed",
                "fields": { "email": "invalid email format" }
            })))
            .mount(&server)
            .await;

        let response: ApiResponse<Value> = client(&server)
            .patch(&MemorySession::default(), "/users/me", RequestOptions::json(json!({ "email": "x" })))
            .await
            .unwrap();

        let failure = response.failure().unwrap();
        assert_eq!(failure.status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(failure.message, "validation failed");
        assert_eq!(failure.field("email"), Some("invalid email format"));
    }

    #[tokio::test]
    async fn failure_without_body_gets_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boards"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let response: ApiResponse<Value> = client(&server)
            .get(&MemorySession::default(), "/boards", RequestOptions::default())
            .await
            .unwrap();

        let failure = response.failure().unwrap();
        assert_eq!(failure.message, "Failed to fetch /boards: 500 Internal Server Error");
        assert_eq!(failure.body, Value::Null);
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boards"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result: Result<ApiResponse<Value>, _> = client(&server)
            .get(&MemorySession::default(), "/boards", RequestOptions::default())
            .await;

        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[tokio::test]
    async fn custom_origin_uses_path_as_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/avatar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("ok")))
            .mount(&server)
            .await;

        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(5)).unwrap();
        let options = RequestOptions {
            custom_origin: true,
            ..Default::default()
        };
        let response: ApiResponse<String> = api
            .get(&MemorySession::default(), &format!("{}/avatar", server.uri()), options)
            .await
            .unwrap();

        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn multipart_body_keeps_its_own_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/me/avatar"))
            .respond_with(|req: &Request| {
                let content_type = req
                    .headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                ResponseTemplate::new(200).set_body_json(json!(content_type))
            })
            .mount(&server)
            .await;

        let options = RequestOptions {
            body: Some(RequestBody::Multipart(Form::new().text("name", "avatar.png"))),
            ..Default::default()
        };
        let response: ApiResponse<String> = client(&server)
            .post(&MemorySession::default(), "/users/me/avatar", options)
            .await
            .unwrap();

        assert!(response.data().unwrap().starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_fault() {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result: Result<ApiResponse<Value>, _> = api
            .get(&MemorySession::default(), "/boards", RequestOptions::default())
            .await;

        assert!(matches!(result, Err(ClientError::Transport(_))));
    }
}
