//! Account Models
//!
//! Data structures for account requests, responses, and database entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// ============================================
// Database Entities
// ============================================

/// Account entity from the store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub fullname: String,
    pub tel: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account fields supplied at creation; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub fullname: String,
    pub tel: String,
}

// ============================================
// Request DTOs
// ============================================

/// Registration request. Missing fields deserialize as empty and fail validation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, message = "Full name is required"))]
    pub fullname: String,

    #[validate(length(min = 1, message = "Telephone is required"))]
    pub tel: String,
}

/// Login request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile update request. Absent or empty fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub tel: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// ============================================
// Response DTOs
// ============================================

/// Account response (public account data without the password digest)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub fullname: String,
    pub tel: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            fullname: account.fullname,
            tel: account.tel,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Authentication response with bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AccountView,
    /// Unix timestamp (seconds) at which `token` stops being accepted
    pub expires_in: i64,
}

/// Simple message response
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================
// JWT Claims
// ============================================

/// JWT claims for identity tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (account ID)
    pub sub: String,
    /// Account username
    pub username: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}
