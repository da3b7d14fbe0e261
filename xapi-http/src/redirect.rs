//! Redirect following.
//!
//! Every hop is rebuilt and re-signed. 307 and 308 keep the original method,
//! body and headers; every other 3xx becomes a bodiless GET.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use tracing::{debug, warn};
use url::Url;

use crate::auth::Authenticator;
use crate::connection::Connection;
use crate::error::XError;
use crate::request::{HttpMethod, Request, RequestBuilder};
use crate::response::Response;

/// Follows 3xx responses up to a fixed number of hops.
#[derive(Debug, Clone, Copy)]
pub struct RedirectHandler<'a> {
    connection: &'a Connection,
    builder: &'a RequestBuilder,
    max_redirects: u32,
}

impl<'a> RedirectHandler<'a> {
    /// Creates a handler that sends hops through `connection`.
    pub fn new(connection: &'a Connection, builder: &'a RequestBuilder, max_redirects: u32) -> Self {
        Self {
            connection,
            builder,
            max_redirects,
        }
    }

    /// Hop budget.
    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// Follows redirects starting from `response` to `request`.
    ///
    /// Returns the first non-redirect response. `Location` is resolved
    /// against `base_url`, so absolute locations win and relative ones land
    /// under the API root. Fails with [`XError::TooManyRedirects`] once more
    /// than `max_redirects` hops have been followed.
    pub async fn handle(
        &self,
        response: Response,
        request: Request,
        base_url: &Url,
        authenticator: &Authenticator,
    ) -> Result<Response, XError> {
        let mut response = response;
        let mut request = request;
        let mut redirect_count: u32 = 0;

        while let Some(location) = response.redirect_location() {
            if redirect_count > self.max_redirects {
                warn!(limit = self.max_redirects, "Redirect limit exceeded");
                return Err(XError::TooManyRedirects {
                    limit: self.max_redirects,
                });
            }

            let new_url = base_url
                .join(location)
                .map_err(|e| XError::InvalidUrl(format!("{location}: {e}")))?;
            let next = self.next_request(&request, response.status(), &new_url, authenticator)?;
            debug!(
                status = %response.status(),
                location = %new_url,
                method = %next.method(),
                hop = redirect_count + 1,
                "Following redirect"
            );

            response = self.connection.perform(&next).await?;
            request = next;
            redirect_count += 1;
        }

        Ok(response)
    }

    fn next_request(
        &self,
        previous: &Request,
        status: StatusCode,
        url: &Url,
        authenticator: &Authenticator,
    ) -> Result<Request, XError> {
        let mut headers: HeaderMap = previous.headers().clone();
        headers.remove(AUTHORIZATION);

        let (method, body) = if preserves_method(status) {
            (previous.method(), previous.body().map(<[u8]>::to_vec))
        } else {
            headers.remove(CONTENT_TYPE);
            (HttpMethod::Get, None)
        };

        self.builder.build(method, url, body, &headers, authenticator)
    }
}

fn preserves_method(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT
    )
}
