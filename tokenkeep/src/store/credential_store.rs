//! Typed facade persisting a single [`Credentials`] bundle.

use super::{SecureStorage, StoreError};
use crate::credentials::Credentials;

/// Key the bundle is stored under unless the caller picks another.
pub const DEFAULT_STORE_KEY: &str = "credentials";

/// Persists exactly one [`Credentials`] bundle under a fixed key.
///
/// The bundle is encoded as JSON. Write failures surface as `false` and read
/// failures as `None`; neither ever yields a partial bundle.
pub struct CredentialStore<S> {
    storage: S,
    key: String,
}

impl<S: SecureStorage> CredentialStore<S> {
    /// Create a store writing under [`DEFAULT_STORE_KEY`].
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORE_KEY)
    }

    /// Create a store writing under a custom key.
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// The key the bundle lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying storage handle.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Serialize `credentials` and overwrite the stored bundle.
    ///
    /// Returns `false` if encoding or the storage write fails.
    pub fn store(&self, credentials: &Credentials) -> bool {
        match self.try_store(credentials) {
            Ok(()) => {
                tracing::debug!(key = %self.key, "Stored credentials");
                true
            }
            Err(e) => {
                tracing::warn!(key = %self.key, "Failed to store credentials: {}", e);
                false
            }
        }
    }

    /// Read the stored bundle.
    ///
    /// Returns `None` if nothing is stored, the read fails, or the stored
    /// bytes do not decode into a bundle.
    pub fn retrieve(&self) -> Option<Credentials> {
        match self.try_retrieve() {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!(key = %self.key, "Discarding unreadable credentials: {}", e);
                None
            }
        }
    }

    /// Remove the stored bundle.
    ///
    /// Returns `true` when the entry is gone afterwards, including when
    /// there was none.
    pub fn clear(&self) -> bool {
        match self.storage.clear(&self.key) {
            Ok(()) => {
                tracing::debug!(key = %self.key, "Cleared credentials");
                true
            }
            Err(e) => {
                tracing::warn!(key = %self.key, "Failed to clear credentials: {}", e);
                false
            }
        }
    }

    fn try_store(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(credentials)?;
        self.storage.set(&self.key, &bytes)
    }

    fn try_retrieve(&self) -> Result<Option<Credentials>, StoreError> {
        match self.storage.get(&self.key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl<S> std::fmt::Debug for CredentialStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
