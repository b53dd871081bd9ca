//! Credential cache with transparent renewal.
//!
//! [`CredentialsManager`] reads the bundle held by a [`CredentialStore`],
//! serves it while the access token is still valid, and otherwise trades the
//! stored refresh token for a fresh bundle through a [`TokenEndpointClient`].
//!
//! Renewed bundles are handed back to the caller and are **not** written to
//! the store. Call [`CredentialsManager::store`] with the result to persist it.
//!
//! # Example
//!
//! ```rust,ignore
//! use tokenkeep::{CredentialsManager, CredentialsManagerError, MemoryStore};
//!
//! async fn access_token(
//!     manager: &CredentialsManager<MemoryStore, impl tokenkeep::TokenEndpointClient>,
//! ) -> Result<String, CredentialsManagerError> {
//!     let credentials = manager.retrieve_and_renew_if_expired(None).await?;
//!     manager.store(&credentials);
//!     Ok(credentials.access_token.expose().to_string())
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::{
    credentials::Credentials,
    endpoint::{RenewError, TokenEndpointClient},
    store::{CredentialStore, SecureStorage},
};

/// Why valid credentials could not be produced.
#[derive(Debug, Error)]
pub enum CredentialsManagerError {
    /// No bundle is stored.
    #[error("no credentials stored")]
    MissingCredentials,

    /// The bundle has no refresh token, so it cannot be renewed.
    #[error("credentials have no refresh token")]
    NoRefreshToken,

    /// The stored bundle has no expiry, so its staleness is unknown.
    #[error("credentials have no expiry information")]
    NoExpiresIn,

    /// The token endpoint did not issue a new bundle.
    #[error("failed to renew credentials: {0}")]
    RenewFailed(#[source] RenewError),
}

impl CredentialsManagerError {
    /// The underlying endpoint failure, for [`RenewFailed`](Self::RenewFailed).
    pub fn renew_error(&self) -> Option<&RenewError> {
        match self {
            Self::RenewFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Serves cached credentials and renews them once they expire.
///
/// The manager holds no mutable state: every call reads the store afresh.
/// Concurrent calls on an expired bundle each perform their own renewal.
///
/// # Type Parameters
///
/// * `S` - The secure storage backend
/// * `C` - The token endpoint client
pub struct CredentialsManager<S, C> {
    store: CredentialStore<S>,
    client: C,
    expiry_leeway: Duration,
}

impl<S: SecureStorage, C: TokenEndpointClient> CredentialsManager<S, C> {
    /// Create a manager storing its bundle under
    /// [`DEFAULT_STORE_KEY`](crate::store::DEFAULT_STORE_KEY).
    pub fn new(storage: S, client: C) -> Self {
        Self::from_store(CredentialStore::new(storage), client)
    }

    /// Create a manager storing its bundle under `key`.
    pub fn with_store_key(storage: S, client: C, key: impl Into<String>) -> Self {
        Self::from_store(CredentialStore::with_key(storage, key), client)
    }

    /// Create a manager around an existing [`CredentialStore`].
    pub fn from_store(store: CredentialStore<S>, client: C) -> Self {
        Self {
            store,
            client,
            expiry_leeway: Duration::zero(),
        }
    }

    /// Treat access tokens expiring within `leeway` as already expired.
    ///
    /// The default leeway is zero: a bundle is served until the instant its
    /// `expires_at` is reached.
    pub fn with_expiry_leeway(mut self, leeway: Duration) -> Self {
        self.expiry_leeway = leeway;
        self
    }

    /// The configured expiry leeway.
    pub fn expiry_leeway(&self) -> Duration {
        self.expiry_leeway
    }

    /// The credential store this manager reads from.
    pub fn credential_store(&self) -> &CredentialStore<S> {
        &self.store
    }

    /// The token endpoint client used for renewal.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Persist `credentials`, replacing any stored bundle.
    pub fn store(&self, credentials: &Credentials) -> bool {
        self.store.store(credentials)
    }

    /// The stored bundle as-is, without any expiry check.
    pub fn retrieve(&self) -> Option<Credentials> {
        self.store.retrieve()
    }

    /// Remove the stored bundle.
    pub fn clear(&self) -> bool {
        self.store.clear()
    }

    /// Return the stored bundle, renewing it first if the access token has expired.
    ///
    /// Checks run in this order, each ending the call:
    /// 1. nothing stored: [`MissingCredentials`](CredentialsManagerError::MissingCredentials)
    /// 2. no refresh token: [`NoRefreshToken`](CredentialsManagerError::NoRefreshToken)
    /// 3. no expiry: [`NoExpiresIn`](CredentialsManagerError::NoExpiresIn)
    /// 4. still valid: the stored bundle, without contacting the endpoint
    /// 5. expired: exactly one renewal request with the stored refresh token
    ///
    /// `scope` narrows or changes the requested scope; `None` asks for the
    /// scope of the original grant.
    pub async fn retrieve_and_renew_if_expired(
        &self,
        scope: Option<&str>,
    ) -> Result<Credentials, CredentialsManagerError> {
        self.retrieve_and_renew_if_expired_at(Utc::now(), scope).await
    }

    /// [`retrieve_and_renew_if_expired`](Self::retrieve_and_renew_if_expired)
    /// with expiry judged at `now`. A token expiring exactly at `now` is expired.
    pub async fn retrieve_and_renew_if_expired_at(
        &self,
        now: DateTime<Utc>,
        scope: Option<&str>,
    ) -> Result<Credentials, CredentialsManagerError> {
        let credentials = self
            .store
            .retrieve()
            .ok_or(CredentialsManagerError::MissingCredentials)?;

        if credentials.refresh_token.is_none() {
            return Err(CredentialsManagerError::NoRefreshToken);
        }

        let expired = credentials
            .is_expired_at(now, self.expiry_leeway)
            .ok_or(CredentialsManagerError::NoExpiresIn)?;

        if !expired {
            tracing::debug!(key = %self.store.key(), "Using cached credentials");
            return Ok(credentials);
        }

        tracing::info!(key = %self.store.key(), "Access token expired, attempting renewal");
        self.renew(&credentials, scope).await
    }

    /// Exchange the refresh token of `credentials` for a fresh bundle.
    ///
    /// Works on the supplied bundle rather than the stored one and never
    /// touches the store. Fails with
    /// [`NoRefreshToken`](CredentialsManagerError::NoRefreshToken) before any
    /// network call if the bundle cannot be renewed.
    pub async fn renew(
        &self,
        credentials: &Credentials,
        scope: Option<&str>,
    ) -> Result<Credentials, CredentialsManagerError> {
        let refresh_token = credentials
            .refresh_token
            .as_ref()
            .ok_or(CredentialsManagerError::NoRefreshToken)?;

        match self.client.renew_access_token(refresh_token, scope).await {
            Ok(renewed) => {
                tracing::info!(key = %self.store.key(), "Successfully renewed credentials");
                Ok(renewed)
            }
            Err(e) => {
                tracing::error!(key = %self.store.key(), "Failed to renew credentials: {}", e);
                Err(CredentialsManagerError::RenewFailed(e))
            }
        }
    }
}

impl<S, C> std::fmt::Debug for CredentialsManager<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsManager")
            .field("store", &self.store)
            .field("expiry_leeway", &self.expiry_leeway)
            .finish_non_exhaustive()
    }
}
