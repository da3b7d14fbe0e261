//! HTTP transport.
//!
//! Wraps a `reqwest::Client` with the configured timeouts and proxy.
//! Redirects are never followed here; [`RedirectHandler`](crate::RedirectHandler)
//! owns that. Host, port and scheme come from each request's URL, so one
//! connection keeps working when the client's base URL changes.

use reqwest::header::{AUTHORIZATION, HeaderMap};
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::error::XError;
use crate::request::Request;
use crate::response::Response;

const WIRE_TARGET: &str = "xapi_http::wire";

/// Executes built requests.
#[derive(Debug, Clone)]
pub struct Connection {
    inner: reqwest::Client,
    open_timeout: Duration,
    read_timeout: Duration,
    write_timeout: Duration,
    proxy_url: Option<Url>,
    debug_output: bool,
}

impl Connection {
    /// Creates a connection from client configuration.
    ///
    /// With no explicit `proxy_url` the standard `HTTP_PROXY`/`HTTPS_PROXY`
    /// environment variables apply.
    pub fn new(config: &ClientConfig) -> Result<Self, XError> {
        let proxy_url = config.proxy_url.as_deref().map(parse_proxy_url).transpose()?;
        let open_timeout = config.open_timeout();
        let read_timeout = config.read_timeout();
        let write_timeout = config.write_timeout();

        let mut builder = reqwest::Client::builder()
            .connect_timeout(open_timeout)
            .read_timeout(read_timeout)
            .timeout(open_timeout.saturating_add(read_timeout).saturating_add(write_timeout))
            .redirect(Policy::none());

        if let Some(ref proxy_url) = proxy_url {
            let proxy =
                reqwest::Proxy::all(proxy_url.as_str()).map_err(|e| XError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            inner: builder.build()?,
            open_timeout,
            read_timeout,
            write_timeout,
            proxy_url,
            debug_output: config.debug_output,
        })
    }

    /// Sends a request and reads the whole response.
    ///
    /// Any transport failure, including timeouts and TLS errors, surfaces
    /// as [`XError::Network`]. HTTP error statuses are returned as normal
    /// responses.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn perform(&self, request: &Request) -> Result<Response, XError> {
        if self.debug_output {
            log_request(request);
        }

        let mut builder = self
            .inner
            .request(request.method().into(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = Response::from_reqwest(builder.send().await?).await?;
        debug!(status = %response.status(), "Response received");

        if self.debug_output {
            log_response(&response);
        }
        Ok(response)
    }

    /// Connect timeout.
    pub fn open_timeout(&self) -> Duration {
        self.open_timeout
    }

    /// Read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Write timeout.
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Explicit proxy, if configured.
    pub fn proxy_url(&self) -> Option<&Url> {
        self.proxy_url.as_ref()
    }

    /// Whether wire logging is on.
    pub fn debug_output(&self) -> bool {
        self.debug_output
    }
}

fn parse_proxy_url(input: &str) -> Result<Url, XError> {
    let url = Url::parse(input).map_err(|e| XError::InvalidProxy(format!("{input}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(XError::InvalidProxy(format!("unsupported proxy scheme {other}"))),
    }
}

fn redacted(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            if *name == AUTHORIZATION {
                format!("{name}: [redacted]")
            } else {
                format!("{name}: {}", value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect()
}

fn log_request(request: &Request) {
    debug!(
        target: WIRE_TARGET,
        method = %request.method(),
        url = %request.url(),
        headers = ?redacted(request.headers()),
        body_len = request.body().map_or(0, <[u8]>::len),
        "-> request"
    );
}

fn log_response(response: &Response) {
    debug!(
        target: WIRE_TARGET,
        status = %response.status(),
        headers = ?redacted(response.headers()),
        body_len = response.body().len(),
        "<- response"
    );
}
