//! Error types for lodge-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::workflow::CoreError;
use lodge_common::auth::AuthError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409) - e.g., duplicate email
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Workflow precondition failure; status code depends on the variant
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Token or credential failure from the auth layer
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// lodge-common error
    #[error("Common error: {0}")]
    Common(#[from] lodge_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Core(ref err) => {
                let (status, code) = core_status(err);
                (status, code, err.to_string())
            }
            ApiError::Auth(ref err) => {
                let (status, code) = auth_status(err);
                (status, code, err.to_string())
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "Request failed: {message}");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Status-code and error-code mapping for workflow failures.
///
/// Validation-class failures are 400, missing entities 404, duplicate or
/// already-decided states 409, and rule violations that depend on current
/// entity state 422.
fn core_status(err: &CoreError) -> (StatusCode, &'static str) {
    match err {
        CoreError::NoUpgradeAvailable => (StatusCode::BAD_REQUEST, "NO_UPGRADE_AVAILABLE"),
        CoreError::AmountMismatch { .. } => (StatusCode::BAD_REQUEST, "AMOUNT_MISMATCH"),
        CoreError::EventIsFree => (StatusCode::BAD_REQUEST, "EVENT_IS_FREE"),
        CoreError::NoMatchingTier { .. } => (StatusCode::BAD_REQUEST, "NO_MATCHING_TIER"),
        CoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        CoreError::PendingPaymentExists => (StatusCode::CONFLICT, "PENDING_PAYMENT_EXISTS"),
        CoreError::PaymentAlreadyExists => (StatusCode::CONFLICT, "PAYMENT_ALREADY_EXISTS"),
        CoreError::AlreadyAttended => (StatusCode::CONFLICT, "ALREADY_ATTENDED"),
        CoreError::NotPending => (StatusCode::CONFLICT, "NOT_PENDING"),
        CoreError::EventNotOpen => (StatusCode::UNPROCESSABLE_ENTITY, "EVENT_NOT_OPEN"),
        CoreError::NotEligible(_) => (StatusCode::UNPROCESSABLE_ENTITY, "NOT_ELIGIBLE"),
        CoreError::WrongKind => (StatusCode::UNPROCESSABLE_ENTITY, "WRONG_KIND"),
        CoreError::NotAnUpgrade { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "NOT_AN_UPGRADE"),
        CoreError::NoSettledPayment => (StatusCode::UNPROCESSABLE_ENTITY, "NO_SETTLED_PAYMENT"),
        CoreError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        CoreError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
    }
}

fn auth_status(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        AuthError::MissingToken
        | AuthError::MalformedToken
        | AuthError::BadSignature
        | AuthError::Expired => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        AuthError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        AuthError::Database(_) | AuthError::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
