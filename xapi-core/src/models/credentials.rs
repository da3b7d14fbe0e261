//! API credentials and authentication mode selection.
//!
//! The X API accepts three credential sets. Only one is used at a time, picked
//! by [`Credentials::auth_mode`] with the precedence OAuth 1.0a > OAuth 2.0 >
//! bearer token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Environment Variables
// ============================================================================

/// Environment variable holding the OAuth 1.0a consumer key.
pub const ENV_API_KEY: &str = "X_API_KEY";
/// Environment variable holding the OAuth 1.0a consumer secret.
pub const ENV_API_KEY_SECRET: &str = "X_API_KEY_SECRET";
/// Environment variable holding the access token (OAuth 1.0a or 2.0).
pub const ENV_ACCESS_TOKEN: &str = "X_ACCESS_TOKEN";
/// Environment variable holding the OAuth 1.0a token secret.
pub const ENV_ACCESS_TOKEN_SECRET: &str = "X_ACCESS_TOKEN_SECRET";
/// Environment variable holding an app-only bearer token.
pub const ENV_BEARER_TOKEN: &str = "X_BEARER_TOKEN";
/// Environment variable holding the OAuth 2.0 client ID.
pub const ENV_CLIENT_ID: &str = "X_CLIENT_ID";
/// Environment variable holding the OAuth 2.0 client secret.
pub const ENV_CLIENT_SECRET: &str = "X_CLIENT_SECRET";
/// Environment variable holding the OAuth 2.0 refresh token.
pub const ENV_REFRESH_TOKEN: &str = "X_REFRESH_TOKEN";

// ============================================================================
// Auth Mode
// ============================================================================

/// Which authentication scheme a credential set resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// OAuth 1.0a user context (HMAC-SHA1 signed requests).
    OAuth1,
    /// OAuth 2.0 user context with refresh support.
    OAuth2,
    /// App-only bearer token.
    Bearer,
    /// No complete credential set.
    None,
}

// ============================================================================
// Credentials
// ============================================================================

/// The full set of credential fields a client may hold.
///
/// Fields are independent so callers can fill them in one at a time; the
/// active mode is derived from which sets are complete. Empty strings are
/// treated the same as missing values.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// OAuth 1.0a consumer key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// OAuth 1.0a consumer secret.
    #[serde(default)]
    pub api_key_secret: Option<String>,
    /// Access token, shared by OAuth 1.0a and OAuth 2.0.
    #[serde(default)]
    pub access_token: Option<String>,
    /// OAuth 1.0a token secret.
    #[serde(default)]
    pub access_token_secret: Option<String>,
    /// App-only bearer token.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// OAuth 2.0 client ID.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth 2.0 client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// OAuth 2.0 refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// When the OAuth 2.0 access token expires, if known.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Creates an OAuth 1.0a credential set.
    pub fn oauth1(
        api_key: impl Into<String>,
        api_key_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: Some(api_key.into()),
            api_key_secret: Some(api_key_secret.into()),
            access_token: Some(access_token.into()),
            access_token_secret: Some(access_token_secret.into()),
            ..Self::default()
        }
    }

    /// Creates an OAuth 2.0 credential set.
    pub fn oauth2(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            ..Self::default()
        }
    }

    /// Creates an app-only bearer token credential set.
    pub fn bearer(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(bearer_token.into()),
            ..Self::default()
        }
    }

    /// Sets the OAuth 2.0 expiry.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Reads credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Reads credentials through a custom variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            api_key: read(ENV_API_KEY),
            api_key_secret: read(ENV_API_KEY_SECRET),
            access_token: read(ENV_ACCESS_TOKEN),
            access_token_secret: read(ENV_ACCESS_TOKEN_SECRET),
            bearer_token: read(ENV_BEARER_TOKEN),
            client_id: read(ENV_CLIENT_ID),
            client_secret: read(ENV_CLIENT_SECRET),
            refresh_token: read(ENV_REFRESH_TOKEN),
            expires_at: None,
        }
    }

    /// Returns true if all four OAuth 1.0a fields are present.
    pub fn has_oauth1(&self) -> bool {
        present(&self.api_key)
            && present(&self.api_key_secret)
            && present(&self.access_token)
            && present(&self.access_token_secret)
    }

    /// Returns true if all four OAuth 2.0 fields are present.
    pub fn has_oauth2(&self) -> bool {
        present(&self.client_id)
            && present(&self.client_secret)
            && present(&self.access_token)
            && present(&self.refresh_token)
    }

    /// Returns true if a bearer token is present.
    pub fn has_bearer(&self) -> bool {
        present(&self.bearer_token)
    }

    /// Resolves the active authentication mode.
    pub fn auth_mode(&self) -> AuthMode {
        if self.has_oauth1() {
            AuthMode::OAuth1
        } else if self.has_oauth2() {
            AuthMode::OAuth2
        } else if self.has_bearer() {
            AuthMode::Bearer
        } else {
            AuthMode::None
        }
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn redact(value: &Option<String>) -> &'static str {
    if present(value) { "[redacted]" } else { "None" }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_key_secret", &redact(&self.api_key_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &redact(&self.access_token_secret))
            .field("bearer_token", &redact(&self.bearer_token))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
