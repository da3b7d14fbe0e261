//! OAuth 2.0 user-context tokens with refresh.

use base64::prelude::*;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use std::fmt;
use tracing::{info, instrument, warn};
use url::Url;
use url::form_urlencoded;

use crate::connection::Connection;
use crate::error::XError;
use crate::request::{HttpMethod, RequestBuilder, header_value};
use crate::response::Response;

/// Token endpoint for refresh-token grants.
pub const TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";

/// A token this close to expiry is treated as already expired.
pub const EXPIRATION_BUFFER_SECS: i64 = 30;

const REFRESH_FAILED: &str = "Token refresh failed";

/// Sends `Bearer <access_token>` and refreshes it on request.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth2Authenticator {
    client_id: String,
    client_secret: String,
    access_token: String,
    refresh_token: String,
    expires_at: Option<DateTime<Utc>>,
    token_url: String,
}

impl OAuth2Authenticator {
    /// Creates an authenticator from the four OAuth 2.0 credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: None,
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Sets when the access token expires.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Points refreshes at a different token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// The `Authorization` header value.
    pub fn header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Current access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Current refresh token.
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Access token expiry, if known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Token endpoint used by [`refresh`](Self::refresh).
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns true if the token is expired or about to be.
    pub fn token_expired(&self) -> bool {
        self.token_expired_at(Utc::now())
    }

    /// [`token_expired`](Self::token_expired) against a fixed clock.
    ///
    /// An unknown expiry is never expired.
    pub fn token_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now >= expires_at - Duration::seconds(EXPIRATION_BUFFER_SECS))
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// On success the token set is updated in place and the full token
    /// response is returned. A refresh token or expiry missing from the
    /// response leaves the current value untouched. The request carries
    /// `builder`'s default headers, `User-Agent` included.
    #[instrument(skip(self, connection, builder), fields(token_url = %self.token_url))]
    pub async fn refresh(&mut self, connection: &Connection, builder: &RequestBuilder) -> Result<Value, XError> {
        let url = Url::parse(&self.token_url).map_err(|e| XError::InvalidUrl(e.to_string()))?;
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "refresh_token")
            .append_pair("refresh_token", &self.refresh_token)
            .finish();
        let basic = BASE64_STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));

        let mut auth = header_value(&format!("Basic {basic}"))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));

        let request = builder.build_unsigned(HttpMethod::Post, &url, Some(body.into_bytes()), &headers);

        let response = connection.perform(&request).await?;
        self.apply_token_response(&response, Utc::now())
    }

    fn apply_token_response(&mut self, response: &Response, now: DateTime<Utc>) -> Result<Value, XError> {
        let Ok(body) = serde_json::from_slice::<Value>(response.body()) else {
            warn!(status = %response.status(), "Token endpoint returned a non-JSON body");
            return Err(XError::TokenRefresh(REFRESH_FAILED.to_string()));
        };

        if !response.status().is_success() {
            let message = body
                .get("error_description")
                .and_then(Value::as_str)
                .or_else(|| body.get("error").and_then(Value::as_str))
                .unwrap_or(REFRESH_FAILED);
            warn!(status = %response.status(), "Token refresh rejected");
            return Err(XError::TokenRefresh(message.to_string()));
        }

        let Some(access_token) = body.get("access_token").and_then(Value::as_str) else {
            return Err(XError::TokenRefresh(REFRESH_FAILED.to_string()));
        };
        self.access_token = access_token.to_string();

        if let Some(refresh_token) = body.get("refresh_token").and_then(Value::as_str) {
            self.refresh_token = refresh_token.to_string();
        }
        if let Some(expires_in) = body.get("expires_in").and_then(Value::as_i64) {
            self.expires_at = Some(now + Duration::seconds(expires_in));
        }

        info!(expires_at = ?self.expires_at, "OAuth 2.0 token refreshed");
        Ok(body)
    }
}

impl fmt::Debug for OAuth2Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Authenticator")
            .field("client_id", &self.client_id)
            .field("expires_at", &self.expires_at)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}
