//! Secure storage abstraction.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`SecureStorage`] - Trait for opaque key/blob storage backends
//! - [`MemoryStore`] - In-memory implementation for testing
//! - [`KeyringStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`CredentialStore`] - Typed facade persisting one [`Credentials`](crate::Credentials) bundle
//! - [`create_store`] - Helper to select backend based on availability
//!
//! # Example
//!
//! ```rust
//! use tokenkeep::store::{MemoryStore, SecureStorage};
//!
//! let store = MemoryStore::new();
//! store.set("tokenkeep/credentials", b"opaque bytes").unwrap();
//!
//! let retrieved = store.get("tokenkeep/credentials").unwrap();
//! assert_eq!(retrieved.as_deref(), Some(&b"opaque bytes"[..]));
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod credential_store;
mod memory;
#[cfg(feature = "keyring-store")]
mod keyring;

pub use credential_store::{CredentialStore, DEFAULT_STORE_KEY};
pub use memory::MemoryStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the backing memory is zeroed when the secret is dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Error type for secure storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// Serialization or deserialization of a stored value failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },
}

/// Abstraction over secure key/blob storage backends.
///
/// Values are opaque byte payloads. Access is synchronous: backends are
/// local (memory, OS keyring), never network-bound.
///
/// Implementations include:
/// - [`MemoryStore`] - In-memory storage for testing
/// - [`KeyringStore`] (with `keyring-store` feature) - OS keyring
pub trait SecureStorage: Send + Sync {
    /// Retrieve the payload stored under `key`.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store a payload at the given key.
    ///
    /// Overwrites any existing value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Remove the payload stored under `key`.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    fn clear(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key exists without handing out the value.
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: SecureStorage + ?Sized> SecureStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        (**self).clear(key)
    }
}

impl<T: SecureStorage + ?Sized> SecureStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        (**self).clear(key)
    }
}

/// Create a storage backend with automatic backend selection.
///
/// - If `prefer_keyring` is `true` and the `keyring-store` feature is enabled,
///   attempts to open a [`KeyringStore`] under `service_name` and falls back
///   to [`MemoryStore`] with a warning if the keyring is unavailable.
/// - Otherwise returns a [`MemoryStore`].
///
/// # Example
///
/// ```rust,ignore
/// use tokenkeep::store::create_store;
///
/// // Try to use keyring, fallback to memory if unavailable
/// let store = create_store(true, "tokenkeep");
/// ```
#[cfg_attr(not(feature = "keyring-store"), allow(unused_variables))]
pub fn create_store(prefer_keyring: bool, service_name: &str) -> Box<dyn SecureStorage> {
    #[cfg(feature = "keyring-store")]
    if prefer_keyring {
        match KeyringStore::try_new(service_name) {
            Ok(store) => {
                tracing::info!(service = service_name, "Using OS keyring for credential storage");
                return Box::new(store);
            }
            Err(e) => {
                tracing::warn!(
                    "Keyring unavailable ({}), falling back to memory store. \
                     Credentials will not persist across restarts.",
                    e
                );
            }
        }
    }

    #[cfg(not(feature = "keyring-store"))]
    if prefer_keyring {
        tracing::warn!(
            "Keyring storage requested but keyring-store feature not enabled. \
             Using memory store. Credentials will not persist across restarts."
        );
    }

    tracing::debug!("Using in-memory credential storage");
    Box::new(MemoryStore::new())
}
