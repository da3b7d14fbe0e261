//! The client facade.
//!
//! Ties the pipeline together: build, perform, follow redirects, parse.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;
use xapi_core::{AuthMode, Credentials};

use crate::auth::Authenticator;
use crate::config::{ClientConfig, parse_http_url};
use crate::connection::Connection;
use crate::error::XError;
use crate::redirect::RedirectHandler;
use crate::request::{HttpMethod, RequestBuilder};
use crate::response::{Response, ResponseParser};

/// An authenticated X API client.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    credentials: Credentials,
    config: ClientConfig,
    base_url: Url,
    authenticator: Authenticator,
    connection: Connection,
    builder: RequestBuilder,
    parser: ResponseParser,
}

impl Client {
    /// Creates a client.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, XError> {
        let base_url = config.base_url()?;
        let connection = Connection::new(&config)?;
        let builder = RequestBuilder::from_config(&config)?;

        let mut client = Self {
            credentials,
            config,
            base_url,
            authenticator: Authenticator::None,
            connection,
            builder,
            parser: ResponseParser::new(),
        };
        client.reinitialize_authenticator();
        debug!(auth_mode = ?client.auth_mode(), base_url = %client.base_url, "Client created");
        Ok(client)
    }

    /// Creates a client with default configuration.
    pub fn with_credentials(credentials: Credentials) -> Result<Self, XError> {
        Self::new(credentials, ClientConfig::default())
    }

    /// Creates a client from `X_*` environment variables and the config file.
    pub fn from_env() -> Result<Self, XError> {
        Self::new(Credentials::from_env(), ClientConfig::load()?)
    }

    /// A copy of this client rooted at a different API base URL.
    pub fn with_base_url(&self, base_url: &str) -> Result<Self, XError> {
        let mut client = self.clone();
        client.set_base_url(base_url)?;
        Ok(client)
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// GET `endpoint`.
    pub async fn get(&self, endpoint: &str) -> Result<Option<Value>, XError> {
        self.request(HttpMethod::Get, endpoint, None, &HeaderMap::new()).await
    }

    /// POST `body` to `endpoint`.
    pub async fn post(&self, endpoint: &str, body: Option<String>) -> Result<Option<Value>, XError> {
        self.request(HttpMethod::Post, endpoint, body.map(String::into_bytes), &HeaderMap::new())
            .await
    }

    /// PUT `body` to `endpoint`.
    pub async fn put(&self, endpoint: &str, body: Option<String>) -> Result<Option<Value>, XError> {
        self.request(HttpMethod::Put, endpoint, body.map(String::into_bytes), &HeaderMap::new())
            .await
    }

    /// DELETE `endpoint`.
    pub async fn delete(&self, endpoint: &str) -> Result<Option<Value>, XError> {
        self.request(HttpMethod::Delete, endpoint, None, &HeaderMap::new()).await
    }

    /// Sends a request and parses the JSON response.
    pub async fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Vec<u8>>,
        headers: &HeaderMap,
    ) -> Result<Option<Value>, XError> {
        self.request_as(method, endpoint, body, headers).await
    }

    /// Sends a request and decodes the JSON response into `T`.
    ///
    /// Returns `Ok(None)` for 204 and other bodies that are not JSON.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Vec<u8>>,
        headers: &HeaderMap,
    ) -> Result<Option<T>, XError> {
        let response = self.send(method, endpoint, body, headers).await?;
        self.parser.parse(&response)
    }

    /// Sends a request, following redirects, without interpreting the result.
    #[instrument(skip(self, body, headers), fields(method = %method, endpoint = %endpoint))]
    pub async fn send(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Vec<u8>>,
        headers: &HeaderMap,
    ) -> Result<Response, XError> {
        let url = self.resolve_url(endpoint)?;
        let request = self
            .builder
            .build(method, &url, body, headers, &self.authenticator)?;
        let response = self.connection.perform(&request).await?;

        RedirectHandler::new(&self.connection, &self.builder, self.config.max_redirects)
            .handle(response, request, &self.base_url, &self.authenticator)
            .await
    }

    /// Joins a relative endpoint onto the base URL; absolute URLs pass through.
    pub fn resolve_url(&self, endpoint: &str) -> Result<Url, XError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| XError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Active authenticator.
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Active authentication scheme.
    pub fn auth_mode(&self) -> AuthMode {
        self.authenticator.mode()
    }

    /// Shared transport.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    // ========================================================================
    // Credentials
    // ========================================================================

    /// Re-derives the authenticator from the current credentials.
    ///
    /// If no credential set is complete the current authenticator is kept.
    pub fn reinitialize_authenticator(&mut self) {
        let Some(authenticator) = Authenticator::from_credentials(&self.credentials) else {
            return;
        };
        self.authenticator = match authenticator {
            Authenticator::OAuth2(oauth2) => {
                Authenticator::OAuth2(oauth2.with_token_url(self.config.token_url.clone()))
            }
            other => other,
        };
    }

    /// Replaces every credential field.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
        self.reinitialize_authenticator();
    }

    /// Sets the OAuth 1.0a consumer key.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.credentials.api_key = Some(api_key.into());
        self.reinitialize_authenticator();
    }

    /// Sets the OAuth 1.0a consumer secret.
    pub fn set_api_key_secret(&mut self, api_key_secret: impl Into<String>) {
        self.credentials.api_key_secret = Some(api_key_secret.into());
        self.reinitialize_authenticator();
    }

    /// Sets the access token.
    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.credentials.access_token = Some(access_token.into());
        self.reinitialize_authenticator();
    }

    /// Sets the OAuth 1.0a token secret.
    pub fn set_access_token_secret(&mut self, access_token_secret: impl Into<String>) {
        self.credentials.access_token_secret = Some(access_token_secret.into());
        self.reinitialize_authenticator();
    }

    /// Sets the bearer token.
    pub fn set_bearer_token(&mut self, bearer_token: impl Into<String>) {
        self.credentials.bearer_token = Some(bearer_token.into());
        self.reinitialize_authenticator();
    }

    /// Sets the OAuth 2.0 client ID.
    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.credentials.client_id = Some(client_id.into());
        self.reinitialize_authenticator();
    }

    /// Sets the OAuth 2.0 client secret.
    pub fn set_client_secret(&mut self, client_secret: impl Into<String>) {
        self.credentials.client_secret = Some(client_secret.into());
        self.reinitialize_authenticator();
    }

    /// Sets the OAuth 2.0 refresh token.
    pub fn set_refresh_token(&mut self, refresh_token: impl Into<String>) {
        self.credentials.refresh_token = Some(refresh_token.into());
        self.reinitialize_authenticator();
    }

    /// Sets the OAuth 2.0 access token expiry.
    pub fn set_expires_at(&mut self, expires_at: DateTime<Utc>) {
        self.credentials.expires_at = Some(expires_at);
        self.reinitialize_authenticator();
    }

    /// Refreshes the OAuth 2.0 access token and stores the new token set.
    #[instrument(skip(self))]
    pub async fn refresh_oauth2_token(&mut self) -> Result<Value, XError> {
        let Authenticator::OAuth2(oauth2) = &mut self.authenticator else {
            return Err(XError::TokenRefresh(
                "OAuth 2.0 credentials are not configured".to_string(),
            ));
        };

        let body = oauth2.refresh(&self.connection, &self.builder).await?;
        self.credentials.access_token = Some(oauth2.access_token().to_string());
        self.credentials.refresh_token = Some(oauth2.refresh_token().to_string());
        self.credentials.expires_at = oauth2.expires_at();

        info!("Stored refreshed OAuth 2.0 credentials");
        Ok(body)
    }

    // ========================================================================
    // Connection Settings
    // ========================================================================

    /// Switches the API root. Takes effect on the next request.
    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), XError> {
        self.base_url = parse_http_url(base_url)?;
        self.config.base_url = base_url.to_string();
        Ok(())
    }

    /// Sets the redirect hop budget.
    pub fn set_max_redirects(&mut self, max_redirects: u32) {
        self.config.max_redirects = max_redirects;
    }

    /// Sets open, read and write timeouts.
    pub fn set_timeouts(&mut self, open: Duration, read: Duration, write: Duration) -> Result<(), XError> {
        let mut config = self.config.clone();
        config.open_timeout_ms = millis(open);
        config.read_timeout_ms = millis(read);
        config.write_timeout_ms = millis(write);
        self.apply_connection_config(config)
    }

    /// Sets or clears the explicit proxy.
    pub fn set_proxy_url(&mut self, proxy_url: Option<String>) -> Result<(), XError> {
        let mut config = self.config.clone();
        config.proxy_url = proxy_url;
        self.apply_connection_config(config)
    }

    /// Turns wire logging on or off.
    pub fn set_debug_output(&mut self, debug_output: bool) -> Result<(), XError> {
        let mut config = self.config.clone();
        config.debug_output = debug_output;
        self.apply_connection_config(config)
    }

    fn apply_connection_config(&mut self, config: ClientConfig) -> Result<(), XError> {
        self.connection = Connection::new(&config)?;
        self.config = config;
        Ok(())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
