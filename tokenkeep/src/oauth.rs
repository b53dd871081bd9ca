//! OAuth 2.0 refresh-token client.
//!
//! This module provides:
//! - [`EndpointConfig`] - Where the token endpoint lives and who the client is
//! - [`OAuthTokenClient`] - [`TokenEndpointClient`] backed by the `oauth2` crate
//!
//! # Features
//!
//! This module is only available when the `oauth` feature is enabled.

use async_trait::async_trait;
use chrono::Utc;
use oauth2::{
    AuthUrl, Client, ClientId, ClientSecret, ExtraTokenFields, RefreshToken, RequestTokenError,
    Scope, StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
    reqwest::async_http_client,
};
use serde::{Deserialize, Serialize};

use crate::{
    credentials::Credentials,
    endpoint::{RenewError, TokenEndpointClient},
    store::Secret,
};

/// Token endpoint configuration.
///
/// # Example
///
/// ```
/// use tokenkeep::oauth::EndpointConfig;
///
/// let endpoint = EndpointConfig::new("https://auth.example.com/oauth/token", "my-client")
///     .with_client_secret("s3cret");
/// assert_eq!(endpoint.client_id, "my-client");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    /// OAuth token endpoint URL.
    pub token_url: String,

    /// OAuth authorization endpoint URL. Not used for renewal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    /// OAuth client ID.
    pub client_id: String,

    /// OAuth client secret, for confidential clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<Secret>,
}

impl EndpointConfig {
    /// Create a configuration for a public client.
    pub fn new(token_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            auth_url: None,
            client_id: client_id.into(),
            client_secret: None,
        }
    }

    /// Set the authorization URL.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    /// Set the client secret.
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(Secret::new(secret));
        self
    }
}

/// Token response fields beyond RFC 6749 that end up in [`Credentials`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdTokenFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenFields {}

type RefreshTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

type RefreshClient = Client<
    BasicErrorResponse,
    RefreshTokenResponse,
    BasicTokenType,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
>;

/// [`TokenEndpointClient`] speaking the OAuth 2.0 refresh-token grant.
///
/// One request per renewal; no retries.
pub struct OAuthTokenClient {
    config: EndpointConfig,
    client: RefreshClient,
}

impl OAuthTokenClient {
    /// Create a client from an endpoint configuration.
    ///
    /// Fails with [`RenewError::Configuration`] if a URL is invalid or the
    /// client ID is empty.
    pub fn new(config: EndpointConfig) -> Result<Self, RenewError> {
        if config.client_id.trim().is_empty() {
            return Err(RenewError::Configuration {
                message: "client ID is empty".to_string(),
            });
        }

        let token_url =
            TokenUrl::new(config.token_url.clone()).map_err(|e| RenewError::Configuration {
                message: format!("invalid token URL: {}", e),
            })?;

        // The authorization URL is mandatory for the oauth2 client but never
        // contacted during renewal.
        let auth_url = AuthUrl::new(
            config
                .auth_url
                .clone()
                .unwrap_or_else(|| config.token_url.clone()),
        )
        .map_err(|e| RenewError::Configuration {
            message: format!("invalid auth URL: {}", e),
        })?;

        let client = RefreshClient::new(
            ClientId::new(config.client_id.clone()),
            config
                .client_secret
                .as_ref()
                .map(|s| ClientSecret::new(s.expose().to_string())),
            auth_url,
            Some(token_url),
        );

        Ok(Self { config, client })
    }

    /// The endpoint configuration.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    fn credentials_from_response(
        response: RefreshTokenResponse,
        used_refresh_token: &Secret,
        requested_scope: Option<&str>,
    ) -> Result<Credentials, RenewError> {
        let token_type: &str = response.token_type().as_ref();
        let mut credentials =
            Credentials::new(response.access_token().secret().as_str()).with_token_type(token_type);

        if let Some(id_token) = &response.extra_fields().id_token {
            credentials = credentials.with_id_token(id_token.as_str());
        }

        // Keep the old refresh token unless the server rotated it.
        credentials = match response.refresh_token() {
            Some(rotated) => credentials.with_refresh_token(rotated.secret().as_str()),
            None => credentials.with_refresh_token(used_refresh_token.expose()),
        };

        if let Some(expires_in) = response.expires_in() {
            let lifetime =
                chrono::Duration::from_std(expires_in).map_err(|e| RenewError::InvalidResponse {
                    message: format!("invalid expiration duration: {}", e),
                })?;
            let expires_at = Utc::now().checked_add_signed(lifetime).ok_or_else(|| {
                RenewError::InvalidResponse {
                    message: format!("expires_in out of range: {}s", expires_in.as_secs()),
                }
            })?;
            credentials = credentials.with_expiry(expires_at);
        }

        // An omitted scope means the requested one was granted (RFC 6749 5.1).
        let granted = response
            .scopes()
            .map(|scopes| {
                scopes
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .or_else(|| requested_scope.map(str::to_string));
        if let Some(scope) = granted {
            credentials = credentials.with_scope(scope);
        }

        Ok(credentials)
    }
}

impl std::fmt::Debug for OAuthTokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokenClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenEndpointClient for OAuthTokenClient {
    async fn renew_access_token(
        &self,
        refresh_token: &Secret,
        scope: Option<&str>,
    ) -> Result<Credentials, RenewError> {
        let refresh = RefreshToken::new(refresh_token.expose().to_string());
        let mut request = self.client.exchange_refresh_token(&refresh);
        if let Some(scope) = scope {
            request = request.add_scopes(scope.split_whitespace().map(|s| Scope::new(s.to_string())));
        }

        tracing::debug!(token_url = %self.config.token_url, "Requesting token renewal");

        let response = request
            .request_async(async_http_client)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(resp) => {
                    let code: &str = resp.error().as_ref();
                    RenewError::Rejected {
                        error: code.to_string(),
                        description: resp.error_description().cloned(),
                    }
                }
                RequestTokenError::Request(e) => RenewError::Transport {
                    message: e.to_string(),
                },
                RequestTokenError::Parse(e, _) => RenewError::InvalidResponse {
                    message: e.to_string(),
                },
                RequestTokenError::Other(message) => RenewError::Other { message },
            })?;

        Self::credentials_from_response(response, refresh_token, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        let config = EndpointConfig::new("https://example.com/token", "client")
            .with_client_secret("secret")
            .with_auth_url("https://example.com/auth");

        let client = OAuthTokenClient::new(config.clone()).unwrap();
        assert_eq!(client.config(), &config);
    }

    #[test]
    fn test_create_client_invalid_token_url() {
        let config = EndpointConfig::new("not a valid url", "client");

        let err = OAuthTokenClient::new(config).unwrap_err();
        assert!(matches!(err, RenewError::Configuration { .. }));
    }

    #[test]
    fn test_create_client_empty_client_id() {
        let config = EndpointConfig::new("https://example.com/token", "  ");

        let err = OAuthTokenClient::new(config).unwrap_err();
        assert!(matches!(err, RenewError::Configuration { .. }));
    }

    #[test]
    fn test_debug_hides_client_secret() {
        let config =
            EndpointConfig::new("https://example.com/token", "client").with_client_secret("hunter2");
        let client = OAuthTokenClient::new(config).unwrap();

        assert!(!format!("{:?}", client).contains("hunter2"));
    }

    #[test]
    fn test_endpoint_config_from_toml() {
        let config: EndpointConfig = toml::from_str(
            r#"
            token_url = "https://example.com/token"
            client_id = "client"
            client_secret = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.client_secret.unwrap().expose(), "secret");
        assert!(config.auth_url.is_none());
    }
}
