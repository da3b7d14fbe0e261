//! RFC 3986 percent-encoding for signatures and query strings.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;
use url::form_urlencoded;

/// Everything except the RFC 3986 unreserved set `ALPHA / DIGIT / - . _ ~`.
pub const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Query values keep literal commas for multi-value fields like `tweet.fields`.
const QUERY_ENCODE_SET: &AsciiSet = &OAUTH_ENCODE_SET.remove(b',');

/// Percent-encodes a string; spaces become `%20`.
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Decoded `(key, value)` pairs of a URL's query string.
pub fn query_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Re-encodes a URL's query so each reserved character is escaped once.
///
/// The query is decoded first, so already-escaped input such as `%23ruby`
/// is left as it was rather than double-encoded.
pub fn normalize_query(url: &mut Url) {
    let Some(query) = url.query() else {
        return;
    };
    if query.is_empty() {
        return;
    }

    let encoded = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(&k, QUERY_ENCODE_SET),
                utf8_percent_encode(&v, QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(Some(&encoded));
}
