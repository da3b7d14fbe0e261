//! Request construction.
//!
//! A [`Request`] is built fresh for every attempt, including every redirect
//! hop, because OAuth 1.0a signatures cover exactly one request.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::encoding::normalize_query;
use crate::error::XError;

// ============================================================================
// HTTP Method
// ============================================================================

/// The HTTP methods the API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// GET requests never carry a body.
    pub fn allows_body(self) -> bool {
        self != Self::Get
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = XError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(XError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// A fully headed request, ready for [`Connection::perform`](crate::Connection::perform).
#[derive(Debug, Clone)]
pub struct Request {
    method: HttpMethod,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a request with no headers and no body.
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Adds or replaces a header.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self, XError> {
        self.headers.insert(name, header_value(value)?);
        Ok(self)
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Headers, including `Authorization`.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body bytes.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue, XError> {
    HeaderValue::from_str(value).map_err(|e| XError::InvalidHeader(e.to_string()))
}

// ============================================================================
// Request Builder
// ============================================================================

/// Applies default headers, query normalization and authentication.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    content_type: HeaderValue,
    user_agent: HeaderValue,
}

impl RequestBuilder {
    /// Creates a builder with the given default headers.
    pub fn new(content_type: &str, user_agent: &str) -> Result<Self, XError> {
        Ok(Self {
            content_type: header_value(content_type)?,
            user_agent: header_value(user_agent)?,
        })
    }

    /// Creates a builder from client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, XError> {
        Self::new(&config.content_type, &config.user_agent)
    }

    /// Builds and signs a request.
    ///
    /// Caller headers override the defaults. The authenticator runs last,
    /// against the normalized URL, so the signature covers what is sent.
    pub fn build(
        &self,
        method: HttpMethod,
        url: &Url,
        body: Option<Vec<u8>>,
        headers: &HeaderMap,
        authenticator: &Authenticator,
    ) -> Result<Request, XError> {
        let mut request = self.build_unsigned(method, url, body, headers);

        let mut auth = header_value(&authenticator.header(method, &request.url))?;
        auth.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, auth);

        Ok(request)
    }

    /// Builds a request with the default headers and no authenticator.
    ///
    /// Used for calls that carry their own `Authorization`, like the
    /// OAuth 2.0 token refresh.
    pub fn build_unsigned(
        &self,
        method: HttpMethod,
        url: &Url,
        body: Option<Vec<u8>>,
        headers: &HeaderMap,
    ) -> Request {
        let mut url = url.clone();
        normalize_query(&mut url);

        let mut all_headers = HeaderMap::new();
        all_headers.insert(CONTENT_TYPE, self.content_type.clone());
        all_headers.insert(USER_AGENT, self.user_agent.clone());
        for name in headers.keys() {
            all_headers.remove(name);
        }
        for (name, value) in headers {
            all_headers.append(name.clone(), value.clone());
        }

        Request {
            method,
            url,
            headers: all_headers,
            body: body.filter(|_| method.allows_body()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{BearerAuthenticator, OAuth1Authenticator};

    fn builder() -> RequestBuilder {
        RequestBuilder::new("application/json; charset=utf-8", "X-Client/0.1.0 Rust").unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        let err = "patch".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, XError::UnsupportedMethod(m) if m == "patch"));
    }

    #[test]
    fn test_default_headers() {
        let request = builder()
            .build(
                HttpMethod::Get,
                &url("https://api.twitter.com/2/users/me"),
                None,
                &HeaderMap::new(),
                &Authenticator::None,
            )
            .unwrap();

        assert_eq!(request.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
        assert_eq!(request.headers()[USER_AGENT], "X-Client/0.1.0 Rust");
        assert_eq!(request.headers()[AUTHORIZATION], "");
    }

    #[test]
    fn test_caller_headers_override_defaults() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("multipart/form-data; boundary=abc"));
        headers.insert("x-custom", HeaderValue::from_static("1"));

        let request = builder()
            .build(
                HttpMethod::Post,
                &url("https://api.twitter.com/2/media/upload"),
                Some(b"payload".to_vec()),
                &headers,
                &Authenticator::Bearer(BearerAuthenticator::new("token")),
            )
            .unwrap();

        assert_eq!(request.headers()[CONTENT_TYPE], "multipart/form-data; boundary=abc");
        assert_eq!(request.headers().get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(request.headers()["x-custom"], "1");
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer token");
        assert_eq!(request.body(), Some(&b"payload"[..]));
    }

    #[test]
    fn test_get_drops_body() {
        let request = builder()
            .build(
                HttpMethod::Get,
                &url("https://api.twitter.com/2/tweets"),
                Some(b"{}".to_vec()),
                &HeaderMap::new(),
                &Authenticator::None,
            )
            .unwrap();
        assert!(request.body().is_none());
    }

    #[test]
    fn test_query_is_normalized() {
        let request = builder()
            .build(
                HttpMethod::Get,
                &url("https://api.twitter.com/2/media/upload?command=STATUS&media_type=video/mp4&ids=1,2"),
                None,
                &HeaderMap::new(),
                &Authenticator::None,
            )
            .unwrap();
        assert_eq!(request.url().query(), Some("command=STATUS&media_type=video%2Fmp4&ids=1,2"));
    }

    #[test]
    fn test_oauth1_header_attached() {
        let auth = Authenticator::OAuth1(OAuth1Authenticator::new("k", "ks", "t", "ts"));
        let request = builder()
            .build(HttpMethod::Get, &url("https://api.twitter.com/2/users/me"), None, &HeaderMap::new(), &auth)
            .unwrap();
        let value = request.headers()[AUTHORIZATION].to_str().unwrap();
        assert!(value.starts_with("OAuth oauth_consumer_key=\"k\""));
        assert!(request.headers()[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_unsigned_keeps_defaults_and_caller_auth() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));

        let request = builder().build_unsigned(
            HttpMethod::Post,
            &url("https://api.twitter.com/2/oauth2/token"),
            Some(b"grant_type=refresh_token".to_vec()),
            &headers,
        );

        assert_eq!(request.headers()[USER_AGENT], "X-Client/0.1.0 Rust");
        assert_eq!(request.headers()[AUTHORIZATION], "Basic abc");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/x-www-form-urlencoded");
        assert_eq!(request.body(), Some(&b"grant_type=refresh_token"[..]));
    }

    #[test]
    fn test_invalid_header_value() {
        assert!(matches!(
            RequestBuilder::new("application/json\n", "agent"),
            Err(XError::InvalidHeader(_))
        ));
    }
}
