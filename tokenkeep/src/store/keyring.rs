//! OS keyring-backed storage implementation.

use keyring::Entry;

use super::{SecureStorage, StoreError};

const AVAILABILITY_CHECK_KEY: &str = "__availability_check__";
const AVAILABILITY_CHECK_VALUE: &[u8] = b"tokenkeep";

/// OS keyring-backed store.
///
/// This store uses the platform's native keyring service:
/// - macOS: Keychain
/// - Linux: kernel keyutils
/// - Windows: Credential Manager
///
/// Each key maps to one keyring entry whose service is the store's
/// `service_name` and whose user is the key. Payloads are written as raw
/// secret bytes, so binary values survive unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use tokenkeep::store::{KeyringStore, SecureStorage};
///
/// let store = KeyringStore::try_new("tokenkeep").unwrap();
/// store.set("credentials", b"{...}").unwrap();
/// ```
pub struct KeyringStore {
    service_name: String,
}

impl KeyringStore {
    /// Try to open a keyring store under the given service name.
    ///
    /// Writes, reads back and deletes a check entry. Returns
    /// [`StoreError::KeyringUnavailable`] if the backend cannot hold a value,
    /// which includes backends that accept writes but keep nothing.
    pub fn try_new(service_name: &str) -> Result<Self, StoreError> {
        let store = Self {
            service_name: service_name.to_string(),
        };
        store.check_round_trip().map_err(|e| StoreError::KeyringUnavailable {
            message: format!("keyring backend not available: {}", e),
        })?;
        Ok(store)
    }

    fn check_round_trip(&self) -> Result<(), StoreError> {
        self.set(AVAILABILITY_CHECK_KEY, AVAILABILITY_CHECK_VALUE)?;
        let read_back = self.get(AVAILABILITY_CHECK_KEY);
        self.clear(AVAILABILITY_CHECK_KEY)?;

        match read_back? {
            Some(value) if value == AVAILABILITY_CHECK_VALUE => Ok(()),
            Some(_) => Err(StoreError::BackendError {
                message: "check entry read back with different contents".to_string(),
            }),
            None => Err(StoreError::BackendError {
                message: "check entry was not kept".to_string(),
            }),
        }
    }

    /// Service name entries are filed under.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(&self.service_name, key).map_err(|e| StoreError::BackendError {
            message: format!("failed to create keyring entry: {}", e),
        })
    }
}

impl std::fmt::Debug for KeyringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringStore")
            .field("service_name", &self.service_name)
            .finish()
    }
}

impl SecureStorage for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entry = self.entry(key)?;

        match entry.get_secret() {
            Ok(bytes) => Ok(Some(bytes)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::Ambiguous(_)) => Err(StoreError::BackendError {
                message: format!("ambiguous keyring entry for key: {}", key),
            }),
            Err(keyring::Error::PlatformFailure(e)) => Err(StoreError::BackendError {
                message: format!("platform keyring failure: {}", e),
            }),
            Err(e) => Err(StoreError::BackendError {
                message: format!("keyring error: {}", e),
            }),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entry(key)?
            .set_secret(value)
            .map_err(|e| StoreError::BackendError {
                message: format!("failed to write keyring entry: {}", e),
            })
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::BackendError {
                message: format!("failed to delete keyring entry: {}", e),
            }),
        }
    }
}
