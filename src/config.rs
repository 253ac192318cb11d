//! Account Service Configuration
//!
//! All configuration values are loaded from environment variables.
//! No hardcoded secrets or sensitive data.

use crate::error::AccountError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Longest accepted token lifetime in seconds (one year)
pub const MAX_TOKEN_LIFETIME: i64 = 365 * 24 * 60 * 60;

/// Account service configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AccountsConfig {
    /// JWT secret key for signing tokens (from JWT_SECRET env var)
    pub jwt_secret: String,

    /// Token lifetime in seconds (from JWT_EXPIRES_IN env var)
    pub token_lifetime: i64,

    /// PostgreSQL connection string (from DATABASE_URL env var).
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,

    /// Upper bound for a single store call in seconds (from STORE_TIMEOUT_SECS env var)
    pub store_timeout_secs: u64,

    /// HTTP listen port (from PORT env var)
    pub server_port: u16,

    /// Argon2 memory cost in KiB (from ARGON2_MEMORY_COST env var)
    pub argon2_memory_cost: u32,

    /// Argon2 time cost (iterations) (from ARGON2_TIME_COST env var)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (from ARGON2_PARALLELISM env var)
    pub argon2_parallelism: u32,
}

impl AccountsConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AccountError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| {
            AccountError::Config("JWT_SECRET environment variable must be set".to_string())
        })?;

        Ok(Self {
            jwt_secret,
            token_lifetime: parse_env("JWT_EXPIRES_IN", 3600), // 1 hour
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            store_timeout_secs: parse_env("STORE_TIMEOUT_SECS", 10),
            server_port: parse_env("PORT", 8080),
            argon2_memory_cost: parse_env("ARGON2_MEMORY_COST", 65536), // 64 MiB
            argon2_time_cost: parse_env("ARGON2_TIME_COST", 3),
            argon2_parallelism: parse_env("ARGON2_PARALLELISM", 4),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AccountError> {
        if self.jwt_secret.len() < 32 {
            return Err(AccountError::Config(
                "JWT_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if self.token_lifetime <= 0 {
            return Err(AccountError::Config(
                "JWT_EXPIRES_IN must be positive".to_string(),
            ));
        }

        if self.token_lifetime > MAX_TOKEN_LIFETIME {
            return Err(AccountError::Config(format!(
                "JWT_EXPIRES_IN must not exceed {} seconds",
                MAX_TOKEN_LIFETIME
            )));
        }

        if self.store_timeout_secs == 0 {
            return Err(AccountError::Config(
                "STORE_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    parse_value(key, env::var(key).ok(), default)
}

fn parse_value<T: FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
        None => default,
    }
}
