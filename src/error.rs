//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "board not found: b1",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                   |
/// |-----------|-----------------|-------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request / 413         |
/// | 2000–2999 | State/Not Found | 404 Not Found / 403 Forbidden |
/// | 3000–3999 | Server          | 500 Internal Server Error     |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Board with the given ID was not found.
    #[error("board not found: {0}")]
    BoardNotFound(String),

    /// No persisted snapshot exists for the given board.
    #[error("no snapshot for board: {0}")]
    SnapshotNotFound(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Board identifier failed validation at the boundary.
    #[error("invalid board id: {0}")]
    InvalidBoardId(String),

    /// Caller is not allowed to perform the operation on this board.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Snapshot payload exceeds the configured size limit.
    #[error("snapshot too large: {size} bytes (limit {limit})")]
    SnapshotTooLarge {
        /// Size of the rejected payload in bytes.
        size: usize,
        /// Configured maximum in bytes.
        limit: usize,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidBoardId(_) => 1002,
            Self::SnapshotTooLarge { .. } => 1003,
            Self::BoardNotFound(_) => 2001,
            Self::SnapshotNotFound(_) => 2002,
            Self::Forbidden(_) => 2003,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidBoardId(_) => StatusCode::BAD_REQUEST,
            Self::SnapshotTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BoardNotFound(_) | Self::SnapshotNotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
