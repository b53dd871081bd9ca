//! Manager configuration.
//!
//! Settings are read from `tokenkeep.toml` in the platform configuration
//! directory (`~/.config/tokenkeep/` on Linux, `~/Library/Application
//! Support/dev.tokenkeep.tokenkeep/` on macOS, `%APPDATA%\tokenkeep\` on
//! Windows). A missing file yields the defaults.
//!
//! ```toml
//! store_key = "credentials"
//! keyring_service = "tokenkeep"
//! prefer_keyring = true
//! expiry_leeway_secs = 0
//!
//! [endpoint]
//! token_url = "https://auth.example.com/oauth/token"
//! client_id = "my-client"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::DEFAULT_STORE_KEY;

#[cfg(feature = "oauth")]
use crate::{
    error::TokenkeepError,
    manager::CredentialsManager,
    oauth::{EndpointConfig, OAuthTokenClient},
    store::{SecureStorage, create_store},
};

/// File name looked up in the configuration directory.
pub const CONFIG_FILE_NAME: &str = "tokenkeep.toml";

/// Largest accepted `expiry_leeway_secs`: one day.
pub const MAX_EXPIRY_LEEWAY_SECS: i64 = 86_400;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values are syntactically fine but unusable.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    /// No home directory could be determined.
    #[error("configuration directory not available")]
    NoConfigDir,
}

/// Settings for building a [`CredentialsManager`](crate::CredentialsManager).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManagerConfig {
    /// Key the credential bundle is stored under.
    pub store_key: String,

    /// Service name used for OS keyring entries.
    pub keyring_service: String,

    /// Use the OS keyring when available instead of memory.
    pub prefer_keyring: bool,

    /// Seconds before expiry at which a token counts as expired.
    pub expiry_leeway_secs: i64,

    /// Token endpoint used for renewal.
    #[cfg(feature = "oauth")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointConfig>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            store_key: DEFAULT_STORE_KEY.to_string(),
            keyring_service: "tokenkeep".to_string(),
            prefer_keyring: true,
            expiry_leeway_secs: 0,
            #[cfg(feature = "oauth")]
            endpoint: None,
        }
    }
}

impl ManagerConfig {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path()?)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_key.is_empty() {
            return Err(ConfigError::Invalid {
                message: "store_key must not be empty".to_string(),
            });
        }
        if self.expiry_leeway_secs < 0 {
            return Err(ConfigError::Invalid {
                message: format!(
                    "expiry_leeway_secs must not be negative (got {})",
                    self.expiry_leeway_secs
                ),
            });
        }
        if self.expiry_leeway_secs > MAX_EXPIRY_LEEWAY_SECS {
            return Err(ConfigError::Invalid {
                message: format!(
                    "expiry_leeway_secs must be at most {} (got {})",
                    MAX_EXPIRY_LEEWAY_SECS, self.expiry_leeway_secs
                ),
            });
        }
        Ok(())
    }

    /// The expiry leeway as a duration, clamped to
    /// `0..=MAX_EXPIRY_LEEWAY_SECS` for configs that skipped validation.
    pub fn expiry_leeway(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.expiry_leeway_secs.clamp(0, MAX_EXPIRY_LEEWAY_SECS))
    }
}

/// Path of the configuration file in the platform configuration directory.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    project_dirs()
        .map(|d| d.config_dir().join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "tokenkeep", "tokenkeep")
}

/// Build a manager from configuration: storage chosen by
/// [`create_store`], renewal through an [`OAuthTokenClient`].
#[cfg(feature = "oauth")]
pub fn build_manager(
    config: &ManagerConfig,
) -> Result<CredentialsManager<Box<dyn SecureStorage>, OAuthTokenClient>, TokenkeepError> {
    config.validate()?;

    let endpoint = config.endpoint.clone().ok_or_else(|| ConfigError::Invalid {
        message: "missing [endpoint] section".to_string(),
    })?;
    let client = OAuthTokenClient::new(endpoint)?;
    let storage = create_store(config.prefer_keyring, &config.keyring_service);

    Ok(
        CredentialsManager::with_store_key(storage, client, config.store_key.clone())
            .with_expiry_leeway(config.expiry_leeway()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.store_key, DEFAULT_STORE_KEY);
        assert_eq!(config.expiry_leeway(), chrono::Duration::zero());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ManagerConfig::from_toml("expiry_leeway_secs = 300").unwrap();
        assert_eq!(config.expiry_leeway(), chrono::Duration::minutes(5));
        assert_eq!(config.keyring_service, "tokenkeep");
    }

    #[test]
    fn test_negative_leeway_rejected() {
        let err = ManagerConfig::from_toml("expiry_leeway_secs = -1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_oversized_leeway_rejected() {
        let err = ManagerConfig::from_toml("expiry_leeway_secs = 9223372036854775807").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = ManagerConfig::from_toml("expiry_leeway_secs = 86401").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let config = ManagerConfig::from_toml("expiry_leeway_secs = 86400").unwrap();
        assert_eq!(config.expiry_leeway(), chrono::Duration::days(1));
    }

    #[test]
    fn test_unvalidated_leeway_is_clamped() {
        let mut config = ManagerConfig::default();
        config.expiry_leeway_secs = i64::MAX;
        assert_eq!(config.expiry_leeway(), chrono::Duration::days(1));

        config.expiry_leeway_secs = -5;
        assert_eq!(config.expiry_leeway(), chrono::Duration::zero());
    }

    #[test]
    fn test_empty_store_key_rejected() {
        let err = ManagerConfig::from_toml("store_key = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = ManagerConfig::from_toml("store_key = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ManagerConfig::load_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, ManagerConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "store_key = \"work\"\nprefer_keyring = false\n").unwrap();

        let config = ManagerConfig::load_from(&path).unwrap();
        assert_eq!(config.store_key, "work");
        assert!(!config.prefer_keyring);
    }

    #[cfg(feature = "oauth")]
    #[test]
    fn test_build_manager_requires_endpoint() {
        let err = build_manager(&ManagerConfig::default()).unwrap_err();
        assert!(matches!(err, TokenkeepError::Config(ConfigError::Invalid { .. })));
    }

    #[cfg(feature = "oauth")]
    #[test]
    fn test_build_manager_from_toml() {
        let config = ManagerConfig::from_toml(
            r#"
            store_key = "profile"
            prefer_keyring = false
            expiry_leeway_secs = 60

            [endpoint]
            token_url = "https://auth.example.com/oauth/token"
            client_id = "cli"
            "#,
        )
        .unwrap();

        let manager = build_manager(&config).unwrap();
        assert_eq!(manager.credential_store().key(), "profile");
        assert_eq!(manager.expiry_leeway(), chrono::Duration::seconds(60));
        assert_eq!(manager.client().config().client_id, "cli");
    }

    #[cfg(feature = "oauth")]
    #[test]
    fn test_build_manager_invalid_endpoint_url() {
        let mut config = ManagerConfig::default();
        config.prefer_keyring = false;
        config.endpoint = Some(EndpointConfig::new("nope", "cli"));

        let err = build_manager(&config).unwrap_err();
        assert!(matches!(err, TokenkeepError::Renew(_)));
    }
}
