//! Login glue shared by the admin back-office, customer login, and the
//! seeding CLI. Credentials are hashed and verified only through
//! [`crate::crypto::passwords`]; storage sits behind [`CredentialStore`].

pub mod store;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::crypto::passwords::{hash_password_async, verify_password_async, CredentialError};
pub use store::{CredentialStore, JsonCredentialStore, StoreError};

const ACCOUNTS_TARGET: &str = "tealeaf::accounts";

/// Well-formed stored value that no account owns. Unknown accounts are
/// verified against it so they cost the same PBKDF2 work as a wrong password.
const UNKNOWN_ACCOUNT_STORED: &str =
    "dGVhbGVhZi11bmtub3duLWFjY291bnQtc2FsdC0tLS0AAAAAAAAAAAAAAAAAAAAA";

/// Which login a credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Realm {
    Admin,
    Customer,
}

impl Realm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Realm::Admin => "admin",
            Realm::Customer => "customer",
        }
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("account name must not be empty")]
    InvalidAccount,
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Store calls run on the blocking pool, like hashing, so file I/O never
/// stalls the async executor.
pub struct Accounts<S> {
    store: Arc<S>,
}

impl<S> Accounts<S>
where
    S: CredentialStore + Send + Sync + 'static,
{
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn with_store<T, F>(&self, call: F) -> Result<T, AccountError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || call(&store))
            .await
            .map_err(|e| StoreError::Io(format!("store task did not complete: {e}")))?;
        Ok(result?)
    }

    /// Sets or replaces a credential. Used for registration, password reset,
    /// and admin seeding.
    pub async fn set_password(
        &self,
        realm: Realm,
        account: &str,
        plaintext: &str,
    ) -> Result<(), AccountError> {
        let account = normalize_account(account)?.to_string();
        let stored = hash_password_async(plaintext.to_string()).await?;
        let key = account.clone();
        self.with_store(move |store| store.save(realm, &key, &stored))
            .await?;
        tracing::info!(target: ACCOUNTS_TARGET, %realm, account = %account, "credential updated");
        Ok(())
    }

    /// Checks a login attempt. Unknown accounts and every verification
    /// failure yield `Ok(false)`; only store failures are errors.
    pub async fn authenticate(
        &self,
        realm: Realm,
        account: &str,
        plaintext: &str,
    ) -> Result<bool, AccountError> {
        let account = normalize_account(account)?.to_string();
        let key = account.clone();
        let stored = self
            .with_store(move |store| store.load(realm, &key))
            .await?;

        let matched = match stored {
            Some(stored) => verify_password_async(plaintext.to_string(), stored).await,
            None => {
                let _ = verify_password_async(
                    plaintext.to_string(),
                    UNKNOWN_ACCOUNT_STORED.to_string(),
                )
                .await;
                false
            }
        };

        if matched {
            tracing::info!(target: ACCOUNTS_TARGET, %realm, account = %account, "login accepted");
        } else {
            tracing::info!(target: ACCOUNTS_TARGET, %realm, account = %account, "login rejected");
        }
        Ok(matched)
    }

    /// Deletes a credential. Returns `false` when the account had none.
    pub async fn remove(&self, realm: Realm, account: &str) -> Result<bool, AccountError> {
        let account = normalize_account(account)?.to_string();
        let key = account.clone();
        let removed = self
            .with_store(move |store| store.remove(realm, &key))
            .await?;
        if removed {
            tracing::info!(target: ACCOUNTS_TARGET, %realm, account = %account, "credential removed");
        }
        Ok(removed)
    }
}

fn normalize_account(account: &str) -> Result<&str, AccountError> {
    let trimmed = account.trim();
    if trimmed.is_empty() {
        return Err(AccountError::InvalidAccount);
    }
    Ok(trimmed)
}
