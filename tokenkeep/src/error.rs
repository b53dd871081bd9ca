//! Top-level error types for tokenkeep.

use thiserror::Error;

use crate::config::ConfigError;
use crate::endpoint::RenewError;
use crate::manager::CredentialsManagerError;
use crate::store::StoreError;

/// Top-level error type encompassing all tokenkeep errors.
#[derive(Debug, Error)]
pub enum TokenkeepError {
    /// Error from secure storage operations.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the credentials manager.
    #[error("credentials error: {0}")]
    Credentials(#[from] CredentialsManagerError),

    /// Error from the token endpoint client.
    #[error("renew error: {0}")]
    Renew(#[from] RenewError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_manager_error() {
        let err: TokenkeepError = CredentialsManagerError::NoExpiresIn.into();
        assert_eq!(
            err.to_string(),
            "credentials error: credentials have no expiry information"
        );
    }

    #[test]
    fn test_renew_failure_keeps_source_chain() {
        use std::error::Error as _;

        let err: TokenkeepError = CredentialsManagerError::RenewFailed(RenewError::Transport {
            message: "connection refused".to_string(),
        })
        .into();

        let manager_err = err.source().unwrap();
        let cause = manager_err.source().unwrap();
        assert_eq!(cause.to_string(), "network error: connection refused");
    }
}
