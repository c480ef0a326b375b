//! Credential storage seam.
//!
//! Secrets are keyed by the target's credential account
//! ([`crate::MountTarget::keychain_account`]) under one fixed service
//! name. An absent secret is `Ok(None)`, never an error: the reconnect
//! loop treats it as "user has not saved a password yet".

use thiserror::Error;

/// Service name all secrets are stored under.
pub const SERVICE_NAME: &str = "sharekeep";

/// Credential store backend failure (locked keychain, denied access,
/// missing keyring daemon). Absence of a secret is not an error.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The platform secret store rejected or failed the operation.
    #[error("credential store: {0}")]
    Backend(String),
}

/// Seam over the platform secret store.
pub trait CredentialStore: Send + Sync {
    /// Fetch the secret for `account`; `Ok(None)` when absent.
    fn get(&self, account: &str) -> Result<Option<String>, CredentialError>;

    /// Store or replace the secret for `account`.
    fn set(&self, account: &str, secret: &str) -> Result<(), CredentialError>;

    /// Delete the secret for `account`; deleting an absent secret is
    /// not an error.
    fn delete(&self, account: &str) -> Result<(), CredentialError>;
}

/// Move a secret from one account to another, replacing whatever the
/// destination held and deleting the source entry.
///
/// Used when editing a target changes its credential account, so the
/// saved password follows the target instead of being stranded under
/// the old key. Returns `true` if a secret was moved; an absent source
/// secret (or identical accounts) is a no-op.
pub fn migrate_secret(
    store: &dyn CredentialStore,
    from: &str,
    to: &str,
) -> Result<bool, CredentialError> {
    if from == to {
        return Ok(false);
    }
    match store.get(from)? {
        Some(secret) => {
            store.set(to, &secret)?;
            store.delete(from)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Production store backed by the OS keychain via the `keyring` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyringStore;

impl KeyringStore {
    /// Create the OS-backed store.
    pub fn new() -> Self {
        Self
    }

    fn entry(account: &str) -> Result<keyring::Entry, CredentialError> {
        keyring::Entry::new(SERVICE_NAME, account)
            .map_err(|e| CredentialError::Backend(e.to_string()))
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, account: &str) -> Result<Option<String>, CredentialError> {
        match Self::entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::Backend(e.to_string())),
        }
    }

    fn set(&self, account: &str, secret: &str) -> Result<(), CredentialError> {
        Self::entry(account)?
            .set_password(secret)
            .map_err(|e| CredentialError::Backend(e.to_string()))
    }

    fn delete(&self, account: &str) -> Result<(), CredentialError> {
        match Self::entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Backend(e.to_string())),
        }
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: parking_lot::Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, account: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.secrets.lock().get(account).cloned())
    }

    fn set(&self, account: &str, secret: &str) -> Result<(), CredentialError> {
        self.secrets
            .lock()
            .insert(account.to_string(), secret.to_string());
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<(), CredentialError> {
        self.secrets.lock().remove(account);
        Ok(())
    }
}
