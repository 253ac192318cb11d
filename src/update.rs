//! Partial account updates
//!
//! [`AccountUpdateBuilder`] collects the fields a caller actually supplied and
//! produces an immutable [`AccountUpdate`] that is handed to the store in a
//! single call.

use crate::models::Account;

use chrono::{DateTime, Utc};

/// Immutable set of account fields to overwrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    fullname: Option<String>,
    tel: Option<String>,
    password_hash: Option<String>,
}

impl AccountUpdate {
    pub fn builder() -> AccountUpdateBuilder {
        AccountUpdateBuilder::default()
    }

    pub fn fullname(&self) -> Option<&str> {
        self.fullname.as_deref()
    }

    pub fn tel(&self) -> Option<&str> {
        self.tel.as_deref()
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Column/value pairs for the fields being changed
    pub fn columns(&self) -> Vec<(&'static str, &str)> {
        [
            ("fullname", self.fullname()),
            ("tel", self.tel()),
            ("password_hash", self.password_hash()),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }

    /// Apply to an in-memory record, stamping `updated_at`
    pub fn apply_to(&self, account: &mut Account, now: DateTime<Utc>) {
        if let Some(fullname) = &self.fullname {
            account.fullname = fullname.clone();
        }
        if let Some(tel) = &self.tel {
            account.tel = tel.clone();
        }
        if let Some(password_hash) = &self.password_hash {
            account.password_hash = password_hash.clone();
        }
        account.updated_at = now;
    }
}

/// Builder for [`AccountUpdate`]. Empty values are ignored.
#[derive(Debug, Default)]
pub struct AccountUpdateBuilder {
    fullname: Option<String>,
    tel: Option<String>,
    password_hash: Option<String>,
}

impl AccountUpdateBuilder {
    pub fn fullname(mut self, fullname: Option<&str>) -> Self {
        if let Some(value) = non_empty(fullname) {
            self.fullname = Some(value);
        }
        self
    }

    pub fn tel(mut self, tel: Option<&str>) -> Self {
        if let Some(value) = non_empty(tel) {
            self.tel = Some(value);
        }
        self
    }

    /// Set an already-hashed password digest
    pub fn password_hash(mut self, digest: Option<String>) -> Self {
        if let Some(value) = digest.filter(|d| !d.is_empty()) {
            self.password_hash = Some(value);
        }
        self
    }

    /// Finish the update; `None` when no field was accepted
    pub fn build(self) -> Option<AccountUpdate> {
        if self.fullname.is_none() && self.tel.is_none() && self.password_hash.is_none() {
            return None;
        }

        Some(AccountUpdate {
            fullname: self.fullname,
            tel: self.tel,
            password_hash: self.password_hash,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
