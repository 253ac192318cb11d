//! Account Service
//!
//! Registration, login and profile management on top of an [`AccountStore`].

use crate::config::AccountsConfig;
use crate::error::AccountError;
use crate::models::*;
use crate::password::CredentialHasher;
use crate::store::{with_timeout, AccountStore};
use crate::token::{IssuedToken, TokenIssuer};
use crate::update::AccountUpdate;

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

/// Account service
///
/// Holds no per-request state; one instance is shared across all requests.
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    tokens: TokenIssuer,
    store_timeout: Duration,
}

impl AccountService {
    /// Create a new account service
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: CredentialHasher,
        tokens: TokenIssuer,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            store_timeout,
        }
    }

    /// Build a service from configuration
    pub fn from_config(
        store: Arc<dyn AccountStore>,
        config: &AccountsConfig,
    ) -> Result<Self, AccountError> {
        Ok(Self::new(
            store,
            CredentialHasher::from_config(config)?,
            TokenIssuer::from_config(config),
            config.store_timeout(),
        ))
    }

    /// Get reference to the token issuer
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    async fn store_call<T>(
        &self,
        call: impl Future<Output = Result<T, AccountError>>,
    ) -> Result<T, AccountError> {
        with_timeout(self.store_timeout, call).await
    }

    fn auth_response(&self, account: Account, now: i64) -> Result<AuthResponse, AccountError> {
        let IssuedToken { token, expires_at } = self
            .tokens
            .issue_at(&account.id.to_string(), &account.username, now)?;

        Ok(AuthResponse {
            token,
            user: AccountView::from(account),
            expires_in: expires_at.timestamp(),
        })
    }

    // ============================================
    // Registration / Login
    // ============================================

    /// Register a new account and issue its first token
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AccountError> {
        req.validate()?;

        // Fail before anything is persisted if no token could be issued
        let now = Utc::now().timestamp();
        self.tokens.expiry_for(now)?;

        let password_hash = self.hasher.hash(&req.password)?;

        let account = self
            .store_call(self.store.create_account(NewAccount {
                username: req.username,
                password_hash,
                fullname: req.fullname,
                tel: req.tel,
            }))
            .await?;

        tracing::info!(account_id = %account.id, username = %account.username, "Account registered");

        self.auth_response(account, now)
    }

    /// Verify credentials and issue a token
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AccountError> {
        req.validate()?;

        // Unknown usernames and wrong passwords are indistinguishable to the caller
        let account = match self.store_call(self.store.find_by_username(&req.username)).await {
            Ok(account) => account,
            Err(AccountError::NotFound) => return Err(AccountError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        if !self.hasher.verify(&req.password, &account.password_hash)? {
            tracing::debug!(account_id = %account.id, "Password mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        tracing::info!(account_id = %account.id, "Account logged in");

        self.auth_response(account, Utc::now().timestamp())
    }

    // ============================================
    // Profile
    // ============================================

    /// Get the profile of an account
    pub async fn get_profile(&self, account_id: &str) -> Result<AccountView, AccountError> {
        let id = parse_account_id(account_id)?;

        let account = self.store_call(self.store.find_by_id(id)).await?;

        Ok(AccountView::from(account))
    }

    /// Apply a partial update and return the refreshed profile
    pub async fn update_account(
        &self,
        account_id: &str,
        req: UpdateAccountRequest,
    ) -> Result<AccountView, AccountError> {
        let id = parse_account_id(account_id)?;

        let password_hash = match req.password.as_deref() {
            Some(password) if !password.is_empty() => Some(self.hasher.hash(password)?),
            _ => None,
        };

        let update = AccountUpdate::builder()
            .fullname(req.fullname.as_deref())
            .tel(req.tel.as_deref())
            .password_hash(password_hash)
            .build()
            .ok_or(AccountError::NoChanges)?;

        self.store_call(self.store.apply_update(id, &update)).await?;

        tracing::info!(
            account_id = %id,
            fields = ?update.columns().iter().map(|(c, _)| *c).collect::<Vec<_>>(),
            "Account updated"
        );

        let account = self.store_call(self.store.find_by_id(id)).await?;

        Ok(AccountView::from(account))
    }

    /// Delete an account
    pub async fn delete_account(&self, account_id: &str) -> Result<(), AccountError> {
        let id = parse_account_id(account_id)?;

        self.store_call(self.store.delete_by_id(id)).await?;

        tracing::info!(account_id = %id, "Account deleted");
        Ok(())
    }
}

fn parse_account_id(account_id: &str) -> Result<Uuid, AccountError> {
    Uuid::parse_str(account_id).map_err(|_| AccountError::InvalidId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAccountStore;
    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    const SECRET: &str = "test-secret-key-at-least-32-bytes";

    fn service_with(store: Arc<dyn AccountStore>) -> AccountService {
        AccountService::new(
            store,
            CredentialHasher::new(1024, 1, 1).unwrap(),
            TokenIssuer::new(SECRET, 3600),
            Duration::from_secs(10),
        )
    }

    fn service() -> (AccountService, Arc<MemoryAccountStore>) {
        let store = Arc::new(MemoryAccountStore::new());
        (service_with(store.clone()), store)
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            password: "s3cret".into(),
            fullname: "Alice A".into(),
            tel: "555-0100".into(),
        }
    }

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_register_returns_view_and_token() {
        let (service, _) = service();

        let response = service.register(alice()).await.unwrap();

        assert_eq!(response.user.username, "alice");
        assert_eq!(response.user.fullname, "Alice A");
        assert_eq!(response.user.tel, "555-0100");

        let claims = service.tokens().verify(&response.token).unwrap();
        assert_eq!(claims.sub, response.user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(response.expires_in, claims.exp);
    }

    #[tokio::test]
    async fn test_register_stores_digest_not_password() {
        let (service, store) = service();
        let response = service.register(alice()).await.unwrap();

        let stored = store.find_by_id(response.user.id).await.unwrap();
        assert_ne!(stored.password_hash, "s3cret");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_requires_all_fields() {
        let (service, store) = service();

        for req in [
            RegisterRequest { username: String::new(), ..alice() },
            RegisterRequest { password: String::new(), ..alice() },
            RegisterRequest { fullname: String::new(), ..alice() },
            RegisterRequest { tel: String::new(), ..alice() },
        ] {
            let result = service.register(req).await;
            assert!(matches!(assert_err!(result), AccountError::Validation(_)));
        }

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_with_unissuable_token_persists_nothing() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = AccountService::new(
            store.clone(),
            CredentialHasher::new(1024, 1, 1).unwrap(),
            TokenIssuer::new(SECRET, i64::MAX),
            Duration::from_secs(10),
        );

        let result = service.register(alice()).await;

        assert!(matches!(result, Err(AccountError::Config(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (service, store) = service();
        service.register(alice()).await.unwrap();

        let second = RegisterRequest {
            password: "other".into(),
            fullname: "Another Alice".into(),
            ..alice()
        };
        let result = service.register(second).await;

        assert!(matches!(result, Err(AccountError::DuplicateUsername)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_login_after_register() {
        let (service, _) = service();
        let registered = service.register(alice()).await.unwrap();

        let response = assert_ok!(service.login(login_req("alice", "s3cret")).await);

        assert_eq!(response.user, registered.user);
        assert!(service.tokens().verify(&response.token).is_ok());
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_user_look_the_same() {
        let (service, _) = service();
        service.register(alice()).await.unwrap();

        let wrong_password = service.login(login_req("alice", "wrong")).await;
        let unknown_user = service.login(login_req("bob", "s3cret")).await;

        assert!(matches!(wrong_password, Err(AccountError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AccountError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let (service, _) = service();

        let result = service.login(login_req("alice", "")).await;
        assert!(matches!(result, Err(AccountError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_profile() {
        let (service, _) = service();
        let registered = service.register(alice()).await.unwrap();

        let view = service
            .get_profile(&registered.user.id.to_string())
            .await
            .unwrap();
        assert_eq!(view, registered.user);
    }

    #[tokio::test]
    async fn test_get_profile_invalid_and_unknown_id() {
        let (service, _) = service();

        assert!(matches!(
            service.get_profile("not-a-uuid").await,
            Err(AccountError::InvalidId)
        ));
        assert!(matches!(
            service.get_profile(&Uuid::new_v4().to_string()).await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_only_tel() {
        let (service, store) = service();
        let registered = service.register(alice()).await.unwrap();
        let id = registered.user.id;
        let before = store.find_by_id(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let req = UpdateAccountRequest {
            tel: Some("555".into()),
            ..Default::default()
        };
        let view = service.update_account(&id.to_string(), req).await.unwrap();

        let after = store.find_by_id(id).await.unwrap();
        assert_eq!(view.tel, "555");
        assert_eq!(after.tel, "555");
        assert_eq!(after.username, before.username);
        assert_eq!(after.fullname, before.fullname);
        assert_eq!(after.password_hash, before.password_hash);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_update_password_is_hashed() {
        let (service, store) = service();
        let registered = service.register(alice()).await.unwrap();
        let id = registered.user.id.to_string();

        let req = UpdateAccountRequest {
            password: Some("n3w-secret".into()),
            ..Default::default()
        };
        service.update_account(&id, req).await.unwrap();

        let stored = store.find_by_id(registered.user.id).await.unwrap();
        assert_ne!(stored.password_hash, "n3w-secret");

        assert!(service.login(login_req("alice", "n3w-secret")).await.is_ok());
        assert!(matches!(
            service.login(login_req("alice", "s3cret")).await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_update_with_nothing_to_change() {
        let (service, store) = service();
        let registered = service.register(alice()).await.unwrap();
        let before = store.find_by_id(registered.user.id).await.unwrap();

        let req = UpdateAccountRequest {
            fullname: Some(String::new()),
            tel: None,
            password: Some(String::new()),
        };
        let result = service
            .update_account(&registered.user.id.to_string(), req)
            .await;

        assert!(matches!(result, Err(AccountError::NoChanges)));
        let after = store.find_by_id(registered.user.id).await.unwrap();
        assert_eq!(after.updated_at, before.updated_at);
        assert_eq!(after.password_hash, before.password_hash);
    }

    #[tokio::test]
    async fn test_update_unknown_account() {
        let (service, _) = service();
        let req = UpdateAccountRequest {
            fullname: Some("Nobody".into()),
            ..Default::default()
        };

        let result = service
            .update_account(&Uuid::new_v4().to_string(), req)
            .await;
        assert!(matches!(result, Err(AccountError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_account() {
        let (service, store) = service();
        let registered = service.register(alice()).await.unwrap();
        let id = registered.user.id.to_string();

        assert_ok!(service.delete_account(&id).await);
        assert!(store.is_empty().await);
        assert!(matches!(
            service.delete_account(&id).await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_account() {
        let (service, _) = service();

        let result = service.delete_account(&Uuid::new_v4().to_string()).await;
        assert!(matches!(result, Err(AccountError::NotFound)));
    }

    /// Store whose every call hangs
    struct StalledStore;

    #[async_trait]
    impl AccountStore for StalledStore {
        async fn create_account(&self, _: NewAccount) -> Result<Account, AccountError> {
            std::future::pending().await
        }
        async fn find_by_username(&self, _: &str) -> Result<Account, AccountError> {
            std::future::pending().await
        }
        async fn find_by_id(&self, _: Uuid) -> Result<Account, AccountError> {
            std::future::pending().await
        }
        async fn apply_update(&self, _: Uuid, _: &AccountUpdate) -> Result<(), AccountError> {
            std::future::pending().await
        }
        async fn delete_by_id(&self, _: Uuid) -> Result<(), AccountError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_store_times_out() {
        let service = AccountService::new(
            Arc::new(StalledStore),
            CredentialHasher::new(1024, 1, 1).unwrap(),
            TokenIssuer::new(SECRET, 3600),
            Duration::from_millis(20),
        );

        assert!(matches!(
            service.register(alice()).await,
            Err(AccountError::StoreTimeout)
        ));
        assert!(matches!(
            service.login(login_req("alice", "s3cret")).await,
            Err(AccountError::StoreTimeout)
        ));
    }
}
