//! API route handlers, organized by namespace:
//!
//! - `quotes`: general quotes (random, list, by id, by category/author)
//! - `anime`: anime quotes (adds by show and by character)
//! - `jokes`: Chuck Norris, dad and programming jokes
//! - `admin`: runtime settings (bearer token required)
//! - `health`: health, status and metrics
//! - `raw`: the embedded dataset blobs as raw JSON

pub mod admin;
pub mod anime;
pub mod health;
pub mod jokes;
pub mod quotes;
pub mod raw;

use crate::error::ServerError;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Standard response envelope: `{success, data}` or `{success, error}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Wrap a payload in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    })
}

/// API version and base info (root endpoint, no authentication).
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "Quotes API",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/random",
            "/api/v1/quotes",
            "/api/v1/quotes/{id}",
            "/api/v1/quotes/category/{category}",
            "/api/v1/quotes/author/{author}",
            "/api/v1/anime",
            "/api/v1/anime/random",
            "/api/v1/chucknorris",
            "/api/v1/chucknorris/random",
            "/api/v1/dadjokes",
            "/api/v1/dadjokes/random",
            "/api/v1/programming",
            "/api/v1/programming/random",
            "/api/v1/status",
            "/api/v1/admin/settings",
            "/health"
        ]
    }))
}

/// 404 handler for undefined routes, kept inside the standard envelope.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
