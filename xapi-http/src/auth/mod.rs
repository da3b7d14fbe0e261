//! Authorization header producers.
//!
//! - [`OAuth1Authenticator`] - HMAC-SHA1 signed user context
//! - [`OAuth2Authenticator`] - Bearer access token with refresh
//! - [`BearerAuthenticator`] - App-only bearer token
//!
//! [`Authenticator`] is the tagged union the pipeline works with.

mod bearer;
mod oauth1;
mod oauth2;

pub use bearer::BearerAuthenticator;
pub use oauth1::OAuth1Authenticator;
pub use oauth2::{EXPIRATION_BUFFER_SECS, OAuth2Authenticator, TOKEN_URL};

use url::Url;
use xapi_core::{AuthMode, Credentials};

use crate::request::HttpMethod;

/// The active authentication scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Authenticator {
    /// Sends an empty `Authorization` header.
    #[default]
    None,
    /// App-only bearer token.
    Bearer(BearerAuthenticator),
    /// OAuth 1.0a signing.
    OAuth1(OAuth1Authenticator),
    /// OAuth 2.0 access token.
    OAuth2(OAuth2Authenticator),
}

impl Authenticator {
    /// Picks the authenticator for a credential set.
    ///
    /// Precedence is OAuth 1.0a, then OAuth 2.0, then bearer. Returns `None`
    /// when no set is complete so the caller can keep its current one.
    pub fn from_credentials(credentials: &Credentials) -> Option<Self> {
        match credentials.auth_mode() {
            AuthMode::OAuth1 => Some(Self::OAuth1(OAuth1Authenticator::new(
                credentials.api_key.clone().unwrap_or_default(),
                credentials.api_key_secret.clone().unwrap_or_default(),
                credentials.access_token.clone().unwrap_or_default(),
                credentials.access_token_secret.clone().unwrap_or_default(),
            ))),
            AuthMode::OAuth2 => {
                let mut oauth2 = OAuth2Authenticator::new(
                    credentials.client_id.clone().unwrap_or_default(),
                    credentials.client_secret.clone().unwrap_or_default(),
                    credentials.access_token.clone().unwrap_or_default(),
                    credentials.refresh_token.clone().unwrap_or_default(),
                );
                if let Some(expires_at) = credentials.expires_at {
                    oauth2 = oauth2.with_expires_at(expires_at);
                }
                Some(Self::OAuth2(oauth2))
            }
            AuthMode::Bearer => Some(Self::Bearer(BearerAuthenticator::new(
                credentials.bearer_token.clone().unwrap_or_default(),
            ))),
            AuthMode::None => None,
        }
    }

    /// The `Authorization` header value for one request.
    pub fn header(&self, method: HttpMethod, url: &Url) -> String {
        match self {
            Self::None => String::new(),
            Self::Bearer(bearer) => bearer.header(),
            Self::OAuth1(oauth1) => oauth1.header(method, url),
            Self::OAuth2(oauth2) => oauth2.header(),
        }
    }

    /// Which scheme this is.
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::None => AuthMode::None,
            Self::Bearer(_) => AuthMode::Bearer,
            Self::OAuth1(_) => AuthMode::OAuth1,
            Self::OAuth2(_) => AuthMode::OAuth2,
        }
    }
}
