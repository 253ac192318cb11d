//! Account Error Types
//!
//! Centralized error handling for all account operations.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Token verification failures
///
/// These never reach a client directly: the authorization gate collapses
/// all of them into [`AccountError::Unauthenticated`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("Token signature is invalid")]
    InvalidSignature,
}

/// Account errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AccountError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Account not found")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid account id")]
    InvalidId,

    #[error("No data to update")]
    NoChanges,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Password hashing failed")]
    Hashing,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store operation timed out")]
    StoreTimeout,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AccountError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
            ),
            AccountError::DuplicateUsername => (
                StatusCode::CONFLICT,
                "username_exists",
                self.to_string(),
            ),
            AccountError::NotFound => (
                StatusCode::NOT_FOUND,
                "account_not_found",
                self.to_string(),
            ),
            AccountError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AccountError::InvalidId => (
                StatusCode::BAD_REQUEST,
                "invalid_id",
                self.to_string(),
            ),
            AccountError::NoChanges => (
                StatusCode::BAD_REQUEST,
                "no_changes",
                self.to_string(),
            ),
            AccountError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid or expired token".to_string(),
            ),
            AccountError::Hashing
            | AccountError::Store(_)
            | AccountError::StoreTimeout
            | AccountError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        (
            status,
            Json(serde_json::json!({
                "error": error_code,
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AccountError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AccountError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AccountError::DuplicateUsername
            }
            _ => {
                tracing::error!("Database error: {:?}", err);
                AccountError::Store(err.to_string())
            }
        }
    }
}

impl From<argon2::password_hash::Error> for AccountError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!("Password hashing error: {:?}", err);
        AccountError::Hashing
    }
}

impl From<validator::ValidationErrors> for AccountError {
    fn from(err: validator::ValidationErrors) -> Self {
        AccountError::Validation(err.to_string())
    }
}
