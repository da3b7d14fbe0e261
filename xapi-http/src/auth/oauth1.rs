//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! Every call to [`OAuth1Authenticator::header`] draws a fresh nonce and
//! timestamp, so a signature is bound to exactly one request. Retries and
//! redirect hops must sign again.

use base64::prelude::*;
use chrono::Utc;
use rand::RngCore;
use ring::hmac;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::encoding::{percent_encode, query_pairs};
use crate::request::HttpMethod;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Signs requests with a consumer key pair and an access token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth1Authenticator {
    api_key: String,
    api_key_secret: String,
    access_token: String,
    access_token_secret: String,
}

impl OAuth1Authenticator {
    /// Creates a signer from the four OAuth 1.0a credentials.
    pub fn new(
        api_key: impl Into<String>,
        api_key_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_key_secret: api_key_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }

    /// The `Authorization` header value for one request.
    pub fn header(&self, method: HttpMethod, url: &Url) -> String {
        let timestamp = Utc::now().timestamp().to_string();
        self.sign_with(method, url, &generate_nonce(), &timestamp)
    }

    /// Signs with a caller-chosen nonce and timestamp.
    pub(crate) fn sign_with(&self, method: HttpMethod, url: &Url, nonce: &str, timestamp: &str) -> String {
        let mut oauth_params = BTreeMap::from([
            ("oauth_consumer_key", self.api_key.clone()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_token", self.access_token.clone()),
            ("oauth_version", OAUTH_VERSION.to_string()),
        ]);

        let base_string = signature_base_string(method, url, &oauth_params);
        let signature = self.signature(&base_string);
        oauth_params.insert("oauth_signature", signature);

        let params = oauth_params
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {params}")
    }

    fn signature(&self, base_string: &str) -> String {
        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.api_key_secret),
            percent_encode(&self.access_token_secret)
        );
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, signing_key.as_bytes());
        let tag = hmac::sign(&key, base_string.as_bytes());
        BASE64_STANDARD.encode(tag.as_ref())
    }
}

impl fmt::Debug for OAuth1Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth1Authenticator")
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

/// `METHOD&encoded(base uri)&encoded(sorted params)`.
fn signature_base_string(method: HttpMethod, url: &Url, oauth_params: &BTreeMap<&str, String>) -> String {
    let mut params: Vec<(String, String)> = oauth_params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .chain(
            query_pairs(url)
                .into_iter()
                .map(|(k, v)| (percent_encode(&k), percent_encode(&v))),
        )
        .collect();
    params.sort();

    let param_string = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut base_uri = url.clone();
    base_uri.set_query(None);
    base_uri.set_fragment(None);

    format!(
        "{}&{}&{}",
        method.as_str(),
        percent_encode(base_uri.as_str()),
        percent_encode(&param_string)
    )
}

/// 16 random bytes as 32 hex characters.
fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
