//! HTTP error types for the Hearth server.
//!
//! Maps gate and provider failures into HTTP responses. Every error variant
//! produces a JSON body with a machine-readable `error` field and a
//! human-readable `message`. Upstream details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use hearth_core::error::{GateError, ProviderError};

/// Application-level error returned from handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No valid session, or the session's user no longer exists.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The identity provider failed or answered garbage.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Upstream(msg) => {
                tracing::error!(error = %msg, "identity provider failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "identity provider unavailable".to_owned(),
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound { .. } => {
                Self::Unauthorized("session user no longer exists".to_owned())
            }
            ProviderError::Api { .. }
            | ProviderError::Transport { .. }
            | ProviderError::Decode { .. } => Self::Upstream(err.to_string()),
        }
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Provider(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_is_unauthorized() {
        let err: AppError = GateError::Provider(ProviderError::NotFound {
            user_id: "user_1".to_owned(),
        })
        .into();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn provider_outage_is_bad_gateway() {
        let err: AppError = ProviderError::Api {
            status: 503,
            body: "maintenance".to_owned(),
        }
        .into();
        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn internal_error_is_500() {
        let resp = AppError::Internal("boom".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
