//! Integration tests for the core model types.

use std::path::Path;

use xapi_core::{
    AuthMode, Credentials, MediaCategory, ProcessingStatus, RateLimits, UploadSession,
    chunk_size_bytes, infer_media_type,
};

#[test]
fn test_credentials_from_env_lookup_selects_oauth1() {
    let creds = Credentials::from_env_with(|name| match name {
        "X_API_KEY" => Some("k".to_string()),
        "X_API_KEY_SECRET" => Some("ks".to_string()),
        "X_ACCESS_TOKEN" => Some("t".to_string()),
        "X_ACCESS_TOKEN_SECRET" => Some("ts".to_string()),
        "X_BEARER_TOKEN" => Some("b".to_string()),
        _ => None,
    });
    assert_eq!(creds.auth_mode(), AuthMode::OAuth1);
}

#[test]
fn test_rate_limited_response_headers() {
    let limits = RateLimits::from_headers([
        ("x-rate-limit-limit", "15"),
        ("x-rate-limit-remaining", "0"),
        ("x-rate-limit-reset", "100"),
        ("x-app-limit-24hour-limit", "1000"),
        ("x-app-limit-24hour-remaining", "0"),
        ("x-app-limit-24hour-reset", "200"),
    ]);
    let effective = limits.effective().unwrap();
    assert_eq!(effective.kind, "app-limit-24hour");
    assert_eq!(effective.reset_in(), 0);
}

#[test]
fn test_upload_planning() {
    let category: MediaCategory = "Tweet_Video".parse().unwrap();
    assert_eq!(infer_media_type(Path::new("movie.mov"), category), "video/mp4");

    let session = UploadSession::new("42", 5 * 1_048_576 + 1, chunk_size_bytes(1).unwrap());
    assert_eq!(session.segment_count, 6);
}

#[test]
fn test_processing_status_from_finalize_body() {
    let body = serde_json::json!({
        "id": "42",
        "processing_info": {"state": "pending", "check_after_secs": 1}
    });
    let status = ProcessingStatus::from_media(&body).unwrap();
    assert!(!status.is_terminal());
}
