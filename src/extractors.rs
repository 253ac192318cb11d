//! Account Extractors
//!
//! Typed access to the identity verified by the authorization gate.

use crate::error::AccountError;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Verified identity of the caller
///
/// Inserted into request extensions by [`crate::middleware::require_auth`];
/// handlers take it as an argument instead of reading untyped request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: String,
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AccountError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AccountError::Unauthenticated)
    }
}
