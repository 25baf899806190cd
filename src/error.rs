use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::dataset::DatasetError;
use crate::settings::SettingsError;
use crate::store::CredentialError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Request-level error taxonomy. Every failure a handler can produce maps to
/// the standard `{success: false, error}` envelope with an appropriate
/// status; nothing escapes to a framework fault page.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Invalid authorization header format")]
    MalformedAuth,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("{0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    NoMatches(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::MissingAuth | ServerError::MalformedAuth => StatusCode::UNAUTHORIZED,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound | ServerError::NoMatches(_) => StatusCode::NOT_FOUND,
            ServerError::Dataset(err) => match err {
                DatasetError::NotFound { .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Settings(err) => match err {
                SettingsError::KeyNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Credentials(err) => match err {
                CredentialError::InvalidCredentials | CredentialError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                CredentialError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 5xx detail stays in the server logs; the client sees a generic
        // message.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("blocking task failed: {err}"))
    }
}
