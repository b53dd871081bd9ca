//! The cached credential bundle.
//!
//! A [`Credentials`] value is what an OAuth2 authorization flow hands back:
//! an access token plus, optionally, an ID token, a refresh token and the
//! instant the access token stops being valid.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Secret;

/// An access/refresh/ID-token bundle.
///
/// A bundle without `expires_at` cannot be checked for staleness, and one
/// without `refresh_token` cannot be renewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The access token presented to resource servers.
    pub access_token: Secret,

    /// Token type as reported by the token endpoint (usually "bearer").
    pub token_type: String,

    /// OpenID Connect ID token, when the grant included `openid`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<Secret>,

    /// Refresh token; absent unless offline access was granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<Secret>,

    /// When the access token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Space-separated scope granted with this bundle, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Credentials {
    /// Create a bearer bundle holding only an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
            token_type: "bearer".to_string(),
            id_token: None,
            refresh_token: None,
            expires_at: None,
            scope: None,
        }
    }

    /// Set the token type.
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    /// Set the ID token.
    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(Secret::new(id_token));
        self
    }

    /// Set the refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(Secret::new(refresh_token));
        self
    }

    /// Set the absolute expiry of the access token.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the expiry relative to now, saturating at the representable range.
    pub fn expires_in(self, duration: Duration) -> Self {
        let expires_at = Utc::now().checked_add_signed(duration).unwrap_or(
            if duration > Duration::zero() {
                DateTime::<Utc>::MAX_UTC
            } else {
                DateTime::<Utc>::MIN_UTC
            },
        );
        self.with_expiry(expires_at)
    }

    /// Set the granted scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Whether the access token is expired at `now`, counting tokens that
    /// expire within `leeway` as expired.
    ///
    /// Returns `None` when the bundle carries no expiry. A positive leeway
    /// reaching past the representable range counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: Duration) -> Option<bool> {
        self.expires_at
            .map(|exp| match now.checked_add_signed(leeway) {
                Some(deadline) => exp <= deadline,
                None => leeway > Duration::zero(),
            })
    }

    /// [`is_expired_at`](Self::is_expired_at) against the current time.
    pub fn is_expired(&self, leeway: Duration) -> Option<bool> {
        self.is_expired_at(Utc::now(), leeway)
    }

    /// Individual scope entries.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let zero = Duration::zero();

        let expired = Credentials::new("a").with_expiry(now - Duration::hours(1));
        assert_eq!(expired.is_expired_at(now, zero), Some(true));

        let valid = Credentials::new("a").with_expiry(now + Duration::hours(1));
        assert_eq!(valid.is_expired_at(now, zero), Some(false));

        let no_expiry = Credentials::new("a");
        assert_eq!(no_expiry.is_expired_at(now, zero), None);
    }

    #[test]
    fn test_expiry_boundary_counts_as_expired() {
        let now = Utc::now();
        let at_now = Credentials::new("a").with_expiry(now);
        assert_eq!(at_now.is_expired_at(now, Duration::zero()), Some(true));
    }

    #[test]
    fn test_leeway_treats_near_expiry_as_expired() {
        let now = Utc::now();
        let soon = Credentials::new("a").with_expiry(now + Duration::minutes(3));

        assert_eq!(soon.is_expired_at(now, Duration::minutes(5)), Some(true));
        assert_eq!(soon.is_expired_at(now, Duration::minutes(2)), Some(false));
    }

    #[test]
    fn test_out_of_range_leeway_does_not_overflow() {
        let now = Utc::now();
        let far = Credentials::new("a").with_expiry(now + Duration::days(365));

        assert_eq!(far.is_expired_at(now, Duration::MAX), Some(true));
        assert_eq!(far.is_expired_at(now, Duration::seconds(10_000_000_000_000)), Some(true));
        assert_eq!(far.is_expired_at(now, Duration::MIN), Some(false));
    }

    #[test]
    fn test_expires_in_saturates() {
        let creds = Credentials::new("a").expires_in(Duration::MAX);
        assert_eq!(creds.expires_at, Some(DateTime::<Utc>::MAX_UTC));
        assert_eq!(creds.is_expired(Duration::zero()), Some(false));
    }

    #[test]
    fn test_serialized_form_omits_absent_fields() {
        let creds = Credentials::new("access");
        let json = serde_json::to_value(&creds).unwrap();

        assert_eq!(json["access_token"], "access");
        assert_eq!(json["token_type"], "bearer");
        assert!(json.get("refresh_token").is_none());
        assert!(json.get("expires_at").is_none());
    }

    #[test]
    fn test_scopes_split_on_whitespace() {
        let creds = Credentials::new("a").with_scope("openid  profile offline_access");
        assert_eq!(creds.scopes(), vec!["openid", "profile", "offline_access"]);
        assert!(Credentials::new("a").scopes().is_empty());
    }
}
