//! Request middleware: auth gate, CORS, rate limiting, request id tracking
//! and request logging.

use crate::error::ServerError;
use crate::rate_limit::{TIER_ADMIN, TIER_API, TIER_GLOBAL};
use crate::state::ServerState;
use crate::store::RequestLogEntry;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, ORIGIN, USER_AGENT};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use std::sync::Arc;

/// Bearer token authentication middleware guarding the admin surface.
///
/// A missing header, a header that is not exactly `Bearer <token>`, and an
/// unknown token are distinct failures, all short-circuiting with 401 before
/// the protected handler runs. On success the request passes through
/// unchanged.
pub async fn bearer_auth(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(ServerError::MissingAuth)?;
    let value = header.to_str().map_err(|_| ServerError::MalformedAuth)?;

    // Exactly two space-separated tokens, scheme case-insensitive.
    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("bearer") {
        return Err(ServerError::MalformedAuth);
    }

    let token = parts[1].to_string();
    let credentials = state.credentials.clone();
    tokio::task::spawn_blocking(move || credentials.validate_token(&token)).await??;

    Ok(next.run(request).await)
}

/// Rate limiting for the outermost tier (every route).
pub async fn rate_limit_global(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    enforce_tier(&state, TIER_GLOBAL)?;
    Ok(next.run(request).await)
}

/// Rate limiting for the `/api/v1` tier.
pub async fn rate_limit_api(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    enforce_tier(&state, TIER_API)?;
    Ok(next.run(request).await)
}

/// Rate limiting for the `/api/v1/admin` tier (the most restrictive).
pub async fn rate_limit_admin(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    enforce_tier(&state, TIER_ADMIN)?;
    Ok(next.run(request).await)
}

fn enforce_tier(state: &ServerState, tier: &str) -> Result<(), ServerError> {
    let enabled = state.settings.get_bool("rate.enabled").unwrap_or(true);
    if !enabled {
        return Ok(());
    }
    if !state.rate_limiter.try_acquire(tier) {
        return Err(ServerError::RateLimitExceeded);
    }
    Ok(())
}

/// CORS middleware driven by the live settings cache, so policy changes made
/// through the admin API apply without a restart.
pub async fn cors(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Response {
    let enabled = state.settings.get_bool("server.cors_enabled").unwrap_or(true);
    if !enabled {
        return next.run(request).await;
    }

    let origins = state
        .settings
        .get_list("server.cors_origins")
        .unwrap_or_else(|_| vec!["*".to_string()]);
    let methods = state
        .settings
        .get_list("server.cors_methods")
        .unwrap_or_default()
        .join(", ");
    let headers = state
        .settings
        .get_list("server.cors_headers")
        .unwrap_or_default()
        .join(", ");
    let credentials = state
        .settings
        .get_bool("server.cors_credentials")
        .unwrap_or(false);

    let request_origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let allow_origin = if origins.iter().any(|o| o == "*") {
        Some("*".to_string())
    } else {
        request_origin.filter(|origin| origins.iter().any(|o| o == origin))
    };

    let is_preflight = request.method() == Method::OPTIONS;
    let mut response = if is_preflight {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = allow_origin {
        let response_headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&origin) {
            response_headers.insert("access-control-allow-origin", value);
        }
        if let Ok(value) = HeaderValue::from_str(&methods) {
            response_headers.insert("access-control-allow-methods", value);
        }
        if let Ok(value) = HeaderValue::from_str(&headers) {
            response_headers.insert("access-control-allow-headers", value);
        }
        if credentials {
            response_headers.insert(
                "access-control-allow-credentials",
                HeaderValue::from_static("true"),
            );
        }
    }

    response
}

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Logging middleware: tracing lines, a request counter, and a best-effort
/// append to the persisted request log (failures there are observability
/// losses, never request failures).
pub async fn log_requests(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let ip_address = client_ip(&request);
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<String>()
        .cloned()
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);

    let entry = RequestLogEntry {
        endpoint: uri.path().to_string(),
        method: method.to_string(),
        ip_address,
        user_agent,
        status_code: status.as_u16(),
        timestamp: Utc::now(),
    };
    let log = state.request_log.clone();
    tokio::task::spawn_blocking(move || {
        if let Err(err) = log.append(&entry) {
            tracing::debug!(error = %err, "request log append failed");
        }
    });

    response
}

fn client_ip(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
