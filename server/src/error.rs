//! Error bridge between the engines and HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parkline_core::error::ParkingError;
use serde::Serialize;

/// Application error wrapping an engine failure for HTTP.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED",
            message: message.into(),
        }
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: "FORBIDDEN",
            message: message.into(),
        }
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            code: "VALIDATION_ERROR",
            message: message.into(),
        }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

/// Map an engine failure kind to an HTTP status and stable error code.
const fn kind_to_status(error: &ParkingError) -> (StatusCode, &'static str) {
    match error {
        ParkingError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ParkingError::Unavailable => (StatusCode::CONFLICT, "UNAVAILABLE"),
        ParkingError::NoCapacity => (StatusCode::CONFLICT, "NO_CAPACITY"),
        ParkingError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
        ParkingError::InvalidOwnership => (StatusCode::FORBIDDEN, "INVALID_OWNERSHIP"),
        ParkingError::DuplicateNumber(_)
        | ParkingError::DuplicateCode(_)
        | ParkingError::DuplicatePlate(_) => (StatusCode::CONFLICT, "DUPLICATE"),
        // A ticket collision that escapes the tracker's retry loop, a
        // corrupted counter, or a store failure: none are client errors.
        ParkingError::DuplicateTicket
        | ParkingError::BoundsError
        | ParkingError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl From<ParkingError> for ApiError {
    fn from(error: ParkingError) -> Self {
        let (status, code) = kind_to_status(&error);
        let message = if status.is_server_error() {
            // Internal detail stays in the logs.
            "An internal error occurred".to_string()
        } else {
            error.to_string()
        };
        Self {
            status,
            code,
            message,
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = self.code,
                message = %self.message,
                "internal server error"
            );
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
