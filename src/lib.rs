//! RustPress Accounts
//!
//! Minimal account service for RustPress providing:
//! - Account registration and login
//! - Argon2id password hashing
//! - HS256 JWT bearer tokens with a configured lifetime
//! - Authenticated profile read, partial update and deletion
//!
//! # Configuration
//!
//! All configuration is loaded from environment variables:
//! - `JWT_SECRET` - Secret key for signing JWTs (required, min 32 chars)
//! - `JWT_EXPIRES_IN` - Token lifetime in seconds (default: 3600)
//! - `DATABASE_URL` - PostgreSQL connection string (optional, in-memory store if unset)
//! - `STORE_TIMEOUT_SECS` - Upper bound for a single store call (default: 10)
//! - `PORT` - HTTP listen port (default: 8080)
//!
//! # Usage
//!
//! ```rust,ignore
//! use rustpress_accounts::{AccountService, AccountsConfig, MemoryAccountStore};
//!
//! let config = AccountsConfig::from_env()?;
//! let store = Arc::new(MemoryAccountStore::new());
//! let accounts = Arc::new(AccountService::from_config(store, &config)?);
//!
//! let app = rustpress_accounts::create_routes(accounts);
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod store;
pub mod token;
pub mod update;

// Re-export commonly used types
pub use config::AccountsConfig;
pub use error::{AccountError, TokenError};
pub use extractors::AuthContext;
pub use handlers::{create_routes, AccountState};
pub use models::*;
pub use password::CredentialHasher;
pub use service::AccountService;
pub use store::{AccountStore, MemoryAccountStore, PgAccountStore};
pub use token::{IssuedToken, TokenIssuer};
pub use update::{AccountUpdate, AccountUpdateBuilder};

use std::sync::Arc;

/// Open the store selected by `config`, running migrations for PostgreSQL
pub async fn open_store(config: &AccountsConfig) -> Result<Arc<dyn AccountStore>, AccountError> {
    match &config.database_url {
        Some(url) => {
            let store = PgAccountStore::connect(url, config.store_timeout()).await?;
            store.migrate().await?;
            tracing::info!("Using PostgreSQL account store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, accounts are kept in memory only");
            Ok(Arc::new(MemoryAccountStore::new()))
        }
    }
}
