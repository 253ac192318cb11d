//! Account HTTP Handlers
//!
//! REST API endpoints for registration, login and profile management.

use crate::error::AccountError;
use crate::extractors::AuthContext;
use crate::middleware;
use crate::models::*;
use crate::service::AccountService;

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Shared account service state
pub type AccountState = Arc<AccountService>;

// ============================================
// Route Builder
// ============================================

/// Create account routes
pub fn create_routes(accounts: AccountState) -> Router {
    // Public routes (no authentication required)
    let public = Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login));

    // Protected routes (require authentication)
    let protected = Router::new()
        .route(
            "/api/profile",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .layer(axum_middleware::from_fn_with_state(
            accounts.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(accounts)
}

// ============================================
// Registration / Login
// ============================================

/// POST /api/register
///
/// Register a new account
pub async fn register(
    State(accounts): State<AccountState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AccountError> {
    let response = accounts.register(req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/login
///
/// Authenticate and return a bearer token
pub async fn login(
    State(accounts): State<AccountState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AccountError> {
    let response = accounts.login(req).await?;

    Ok(Json(response))
}

// ============================================
// Profile
// ============================================

/// GET /api/profile
pub async fn get_profile(
    State(accounts): State<AccountState>,
    auth: AuthContext,
) -> Result<impl IntoResponse, AccountError> {
    let view = accounts.get_profile(&auth.account_id).await?;

    Ok(Json(view))
}

/// PUT /api/profile
pub async fn update_profile(
    State(accounts): State<AccountState>,
    auth: AuthContext,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AccountError> {
    let view = accounts.update_account(&auth.account_id, req).await?;

    Ok(Json(view))
}

/// DELETE /api/profile
pub async fn delete_profile(
    State(accounts): State<AccountState>,
    auth: AuthContext,
) -> Result<impl IntoResponse, AccountError> {
    accounts.delete_account(&auth.account_id).await?;

    Ok(Json(MessageResponse::new("Account deleted successfully")))
}
