//! Authorization Middleware
//!
//! Bearer token gate for protected routes.

use crate::error::AccountError;
use crate::extractors::AuthContext;
use crate::handlers::AccountState;
use crate::token::TokenIssuer;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

/// Extract the token from a header of the exact form `Bearer <token>`
fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Validate an `Authorization` header value and return the caller's identity
///
/// Every failure is reported as `Unauthenticated`; the specific token error
/// is only logged.
pub fn authenticate(
    auth_header: Option<&str>,
    tokens: &TokenIssuer,
) -> Result<AuthContext, AccountError> {
    let header = auth_header.ok_or(AccountError::Unauthenticated)?;

    let token = bearer_token(header).ok_or_else(|| {
        tracing::debug!("Invalid authorization header format");
        AccountError::Unauthenticated
    })?;

    let claims = tokens.verify(token).map_err(|e| {
        tracing::debug!("JWT validation failed: {}", e);
        AccountError::Unauthenticated
    })?;

    Ok(AuthContext {
        account_id: claims.sub,
        username: claims.username,
    })
}

/// Require authenticated caller
///
/// Validates the bearer token and stores the [`AuthContext`] in request
/// extensions for the extractor.
pub async fn require_auth(
    State(accounts): State<AccountState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AccountError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let context = authenticate(auth_header, accounts.tokens())?;

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
