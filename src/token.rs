//! Identity Tokens
//!
//! HS256-signed JWTs carrying the account id and username. Verification is
//! stateless: no store access is needed to accept or reject a token.

use crate::config::AccountsConfig;
use crate::error::{AccountError, TokenError};
use crate::models::TokenClaims;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

/// A freshly minted token and the moment it stops being accepted
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token issuer and verifier keyed by a shared secret
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: i64,
}

impl TokenIssuer {
    /// Create an issuer for `secret` minting tokens valid for `lifetime` seconds
    pub fn new(secret: &str, lifetime: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked after decoding so that `now >= exp` is rejected
        // without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    pub fn from_config(config: &AccountsConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_lifetime)
    }

    /// Expiry of a token issued at `now` (unix seconds)
    pub fn expiry_for(&self, now: i64) -> Result<DateTime<Utc>, AccountError> {
        now.checked_add(self.lifetime)
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
            .ok_or_else(|| AccountError::Config("Token expiry out of range".to_string()))
    }

    /// Issue a token for an account
    pub fn issue(&self, account_id: &str, username: &str) -> Result<IssuedToken, AccountError> {
        self.issue_at(account_id, username, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (unix seconds)
    pub fn issue_at(
        &self,
        account_id: &str,
        username: &str,
        now: i64,
    ) -> Result<IssuedToken, AccountError> {
        let expires_at = self.expiry_for(now)?;
        let exp = expires_at.timestamp();

        let claims = TokenClaims {
            sub: account_id.to_string(),
            username: username.to_string(),
            iat: now,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {:?}", e);
                AccountError::Config(format!("Unable to sign token: {}", e))
            })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as if the current time were `now` (unix seconds)
    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, TokenError> {
        // `decode` checks the signature before handing back any claim.
        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        let claims = token_data.claims;
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
