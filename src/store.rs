//! Account Store
//!
//! Persistence contract for accounts plus the PostgreSQL and in-memory
//! implementations. Username uniqueness and atomic updates are the store's
//! responsibility.

use crate::error::AccountError;
use crate::models::{Account, NewAccount};
use crate::update::AccountUpdate;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Account persistence
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Fails with `DuplicateUsername` if taken.
    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountError>;

    async fn find_by_username(&self, username: &str) -> Result<Account, AccountError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Account, AccountError>;

    /// Overwrite the fields in `update` and stamp `updated_at`
    async fn apply_update(&self, id: Uuid, update: &AccountUpdate) -> Result<(), AccountError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), AccountError>;
}

/// Run a store call, failing with `StoreTimeout` once `limit` elapses
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, AccountError>
where
    F: Future<Output = Result<T, AccountError>>,
{
    tokio::time::timeout(limit, call).await.map_err(|_| {
        tracing::error!(timeout_ms = limit.as_millis() as u64, "Store call timed out");
        AccountError::StoreTimeout
    })?
}

// ============================================
// PostgreSQL
// ============================================

/// PostgreSQL-backed account store
#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open a connection pool for `database_url`
    pub async fn connect(database_url: &str, timeout: Duration) -> Result<Self, AccountError> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await?;

        Ok(Self::new(db))
    }

    /// Create the accounts table if it does not exist
    pub async fn migrate(&self) -> Result<(), AccountError> {
        tracing::info!("Running account database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                username VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                fullname VARCHAR(255) NOT NULL,
                tel VARCHAR(64) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(&self.db)
        .await?;

        tracing::info!("Account migrations completed successfully");
        Ok(())
    }
}

/// Build the partial `UPDATE` for `update`, touching only its columns
fn update_query(id: Uuid, update: &AccountUpdate) -> QueryBuilder<'_, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE accounts SET updated_at = NOW()");
    for (column, value) in update.columns() {
        query.push(", ").push(column).push(" = ").push_bind(value);
    }
    query.push(" WHERE id = ").push_bind(id);
    query
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (username, password_hash, fullname, tel)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.fullname)
        .bind(&account.tel)
        .fetch_one(&self.db)
        .await?;

        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> Result<Account, AccountError> {
        sqlx::query_as("SELECT * FROM accounts WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AccountError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Account, AccountError> {
        sqlx::query_as("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AccountError::NotFound)
    }

    async fn apply_update(&self, id: Uuid, update: &AccountUpdate) -> Result<(), AccountError> {
        let mut query = update_query(id, update);

        let result = query.build().execute(&self.db).await?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound);
        }

        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), AccountError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound);
        }

        Ok(())
    }
}

// ============================================
// In-memory
// ============================================

/// Process-local account store
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountError> {
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|a| a.username == account.username) {
            return Err(AccountError::DuplicateUsername);
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: account.username,
            password_hash: account.password_hash,
            fullname: account.fullname,
            tel: account.tel,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> Result<Account, AccountError> {
        self.accounts
            .read()
            .await
            .values()
            .find(|a| a.username == username)
            .cloned()
            .ok_or(AccountError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Account, AccountError> {
        self.accounts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AccountError::NotFound)
    }

    async fn apply_update(&self, id: Uuid, update: &AccountUpdate) -> Result<(), AccountError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(&id).ok_or(AccountError::NotFound)?;
        update.apply_to(account, Utc::now());
        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), AccountError> {
        self.accounts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(AccountError::NotFound)
    }
}
