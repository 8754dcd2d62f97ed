use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Unified API error type.
///
/// Every failure a handler can surface maps onto one of these variants;
/// none of them is treated as process-fatal.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or missing Telegram signature, invalid or expired session.
    /// Deliberately carries no detail about what went wrong.
    #[error("forbidden")]
    AuthenticationRejected,

    /// Malformed input shape, rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    /// The downstream API returned an error payload; message passed through.
    #[error("{0}")]
    Upstream(String),

    /// The persistence layer is unreachable or failed a write.
    #[error("storage unavailable")]
    Storage(String),

    /// A write operation requiring elevated authorization was requested.
    #[error("requires higher privilege")]
    CapabilityUnsupported,

    /// Anything else that should never surface detail to the caller.
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationRejected => "forbidden",
            Self::Validation(_) => "validation_failed",
            Self::Upstream(_) => "upstream_error",
            Self::Storage(_) => "storage_unavailable",
            Self::CapabilityUnsupported => "capability_unsupported",
            Self::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::AuthenticationRejected | Self::CapabilityUnsupported => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Storage and internal details are logged but never leaked.
        let message = match &self {
            Self::Storage(detail) => {
                error!(error = %detail, "storage error");
                "storage unavailable".to_string()
            }
            Self::Internal(detail) => {
                error!(error = %detail, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::AuthenticationRejected.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::validation("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::upstream("oops").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::storage("db down").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::CapabilityUnsupported.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn forbidden_is_generic() {
        // The caller must not learn whether the signature or the session failed.
        assert_eq!(ApiError::AuthenticationRejected.to_string(), "forbidden");
    }

    #[test]
    fn capability_message_is_fixed() {
        assert_eq!(
            ApiError::CapabilityUnsupported.to_string(),
            "requires higher privilege"
        );
    }
}
