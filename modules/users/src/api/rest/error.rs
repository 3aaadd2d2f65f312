use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::api::rest::envelope::ApiResponse;
use crate::domain::error::DomainError;

/// Failure side of every handler; renders as an envelope with `success: false`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The body could not be read or decoded.
    pub fn bad_request(reason: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("bad request: {reason}"))
    }
}

/// Map a domain error to a status and an `error <operation>: ...` message.
/// `context` names the operation for errors that do not carry one.
pub fn map_domain_error(e: &DomainError, context: &str) -> ApiError {
    match e {
        DomainError::EmptyUpdate | DomainError::MissingId => {
            ApiError::new(StatusCode::BAD_REQUEST, format!("error {context}: {e}"))
        }
        // A missing row surfaces from a failed storage read and is reported as such.
        DomainError::NotFound { .. } => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("error {context}: {e}"),
        ),
        DomainError::Storage { operation, message } => {
            tracing::error!(operation = *operation, error = %message, "storage failure");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error {operation}: {message}"),
            )
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}
