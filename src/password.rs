//! Credential Hashing
//!
//! Argon2id password digests in PHC string format.

use crate::config::AccountsConfig;
use crate::error::AccountError;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// One-way password hasher
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Create a hasher with explicit Argon2 cost parameters
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Result<Self, AccountError> {
        let params = Params::new(memory_cost, time_cost, parallelism, None).map_err(|e| {
            AccountError::Config(format!("Invalid Argon2 parameters: {}", e))
        })?;

        Ok(Self { params })
    }

    pub fn from_config(config: &AccountsConfig) -> Result<Self, AccountError> {
        Self::new(
            config.argon2_memory_cost,
            config.argon2_time_cost,
            config.argon2_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AccountError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();

        Ok(hash)
    }

    /// Verify a password against a digest
    ///
    /// A mismatch is `Ok(false)`; only an unparseable digest is an error.
    /// The digest carries its own parameters, so digests produced under
    /// different cost settings still verify.
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool, AccountError> {
        let parsed_hash = PasswordHash::new(digest).map_err(|e| {
            tracing::error!("Malformed password digest: {:?}", e);
            AccountError::Hashing
        })?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
