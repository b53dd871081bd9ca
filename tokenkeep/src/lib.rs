//! # tokenkeep
//!
//! Local cache for one OAuth2 credential bundle, with transparent renewal.
//!
//! This crate provides:
//! - [`Credentials`] - The access/refresh/ID-token bundle
//! - [`SecureStorage`] - Trait for opaque blob storage, with in-memory and
//!   (optionally) OS keyring implementations
//! - [`CredentialStore`] - Persists a single bundle under a fixed key
//! - [`TokenEndpointClient`] - Trait for the refresh-token grant, with an
//!   `oauth2`-based implementation behind the `oauth` feature
//! - [`CredentialsManager`] - Serves the cached bundle and renews it once expired
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tokenkeep::{CredentialsManager, MemoryStore, oauth::{EndpointConfig, OAuthTokenClient}};
//!
//! async fn bearer() -> Result<String, tokenkeep::TokenkeepError> {
//!     let client = OAuthTokenClient::new(EndpointConfig::new(
//!         "https://auth.example.com/oauth/token",
//!         "my-client",
//!     ))?;
//!     let manager = CredentialsManager::new(MemoryStore::new(), client);
//!
//!     let credentials = manager.retrieve_and_renew_if_expired(None).await?;
//!     manager.store(&credentials);
//!     Ok(credentials.access_token.expose().to_string())
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod manager;
pub mod store;

#[cfg(feature = "oauth")]
pub mod oauth;

// Re-export commonly used types at crate root
pub use credentials::Credentials;

pub use store::{
    CredentialStore,
    DEFAULT_STORE_KEY,
    MemoryStore,
    Secret,
    SecureStorage,
    StoreError,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use endpoint::{
    RenewError,
    TokenEndpointClient,
};

pub use manager::{
    CredentialsManager,
    CredentialsManagerError,
};

pub use config::{
    ConfigError,
    ManagerConfig,
};

#[cfg(feature = "oauth")]
pub use config::build_manager;

#[cfg(feature = "oauth")]
pub use oauth::{
    EndpointConfig,
    OAuthTokenClient,
};

pub use error::TokenkeepError;
