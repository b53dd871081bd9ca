//! Token endpoint contract.
//!
//! This module provides:
//! - [`TokenEndpointClient`] - Trait for exchanging a refresh token for a new bundle
//! - [`RenewError`] - Introspectable failure of that exchange

use async_trait::async_trait;
use thiserror::Error;

use crate::credentials::Credentials;
use crate::store::Secret;

/// OAuth error code returned when a refresh token is invalid, expired or revoked.
pub const INVALID_GRANT: &str = "invalid_grant";

/// Error type for token renewal.
#[derive(Debug, Error)]
pub enum RenewError {
    /// The token endpoint answered with an OAuth error response.
    #[error("token endpoint rejected renewal: {error}{}", describe(.description))]
    Rejected {
        /// OAuth error code, e.g. `invalid_grant`.
        error: String,
        /// Human-readable `error_description`, if any.
        description: Option<String>,
    },

    /// The request never produced a response (DNS, TLS, connection, timeout).
    #[error("network error: {message}")]
    Transport { message: String },

    /// The endpoint answered but the body was not a usable token response.
    #[error("invalid token response: {message}")]
    InvalidResponse { message: String },

    /// The client is misconfigured (bad URL, missing client ID).
    #[error("token endpoint misconfigured: {message}")]
    Configuration { message: String },

    /// Any other failure.
    #[error("renewal failed: {message}")]
    Other { message: String },
}

fn describe(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

impl RenewError {
    /// The OAuth error code, when the endpoint supplied one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Rejected { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether the refresh token itself was refused.
    ///
    /// Callers usually respond to this by sending the user through login again.
    pub fn is_invalid_grant(&self) -> bool {
        self.error_code() == Some(INVALID_GRANT)
    }

    /// Whether the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Client for the token endpoint's refresh-token grant.
///
/// # Example
///
/// ```rust,ignore
/// use tokenkeep::{TokenEndpointClient, Secret};
///
/// async fn refresh(client: &impl TokenEndpointClient) -> Result<(), tokenkeep::RenewError> {
///     let fresh = client.renew_access_token(&Secret::new("R1"), None).await?;
///     println!("new token expires at {:?}", fresh.expires_at);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait TokenEndpointClient: Send + Sync {
    /// Exchange `refresh_token` for a fresh bundle.
    ///
    /// `scope` is a space-separated scope list. When `None`, the endpoint
    /// re-issues the scope set of the original grant.
    async fn renew_access_token(
        &self,
        refresh_token: &Secret,
        scope: Option<&str>,
    ) -> Result<Credentials, RenewError>;
}

#[async_trait]
impl<T: TokenEndpointClient + ?Sized> TokenEndpointClient for Box<T> {
    async fn renew_access_token(
        &self,
        refresh_token: &Secret,
        scope: Option<&str>,
    ) -> Result<Credentials, RenewError> {
        (**self).renew_access_token(refresh_token, scope).await
    }
}

#[async_trait]
impl<T: TokenEndpointClient + ?Sized> TokenEndpointClient for std::sync::Arc<T> {
    async fn renew_access_token(
        &self,
        refresh_token: &Secret,
        scope: Option<&str>,
    ) -> Result<Credentials, RenewError> {
        (**self).renew_access_token(refresh_token, scope).await
    }
}
