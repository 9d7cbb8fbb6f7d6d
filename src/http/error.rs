//! REST error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::error::CountingError;
use crate::store::StoreError;

/// Errors returned by API handlers, rendered as `{error: {code, message}}`
/// where `code` is the numeric HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unprocessable(_) => "unprocessable",
            Self::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn guild_not_found(guild: &str) -> Self {
        Self::NotFound(format!("server {} not found", guild))
    }

    pub fn member_not_found(member: &str) -> Self {
        Self::NotFound(format!("user {} not found", member))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "Store failure while serving API request");
        crate::metrics::record_store_error(e.error_code());
        Self::Internal("internal storage error".to_string())
    }
}

impl From<CountingError> for ApiError {
    fn from(e: CountingError) -> Self {
        match e {
            CountingError::NotEnabled => Self::NotFound("server not found".to_string()),
            CountingError::AlreadyEnabled => Self::Unprocessable(e.to_string()),
            CountingError::InvalidInput(inner) => Self::Unprocessable(inner.to_string()),
            // Already logged and counted by the service.
            CountingError::Store(_) => Self::Internal("internal storage error".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(code = self.error_code(), error = %self, "API request failed");
        let body = json!({
            "error": {
                "code": self.status().as_u16(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}
