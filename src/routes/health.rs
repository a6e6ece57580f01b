use axum::response::Json;
use serde_json::json;

/// Health check endpoint handler.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
///
/// # Response Format
/// ```json
/// { "status": "pong", "service": "kanban-web" }
/// ```
///
/// Used by load balancers and container probes; it never touches the remote API.
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong", "service": env!("CARGO_PKG_NAME") }))
}
