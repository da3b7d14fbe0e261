//! Upload flows against a mock server.

use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xapi_core::{CoreError, Credentials};
use xapi_http::{Client, ClientConfig, ErrorKind};

use crate::{AccountUploader, BannerOptions, MediaError, MediaUploader};

const MIB: usize = 1_048_576;

struct Harness {
    server: MockServer,
    client: Client,
    work: TempDir,
    temp_root: TempDir,
}

impl Harness {
    async fn start() -> Self {
        let server = MockServer::start().await;
        let config = ClientConfig {
            base_url: format!("{}/2/", server.uri()),
            ..ClientConfig::default()
        };
        let client = Client::new(Credentials::bearer("TEST_BEARER_TOKEN"), config).unwrap();
        Self {
            server,
            client,
            work: tempfile::tempdir().unwrap(),
            temp_root: tempfile::tempdir().unwrap(),
        }
    }

    fn uploader(&self) -> MediaUploader {
        MediaUploader::new(self.client.clone()).with_temp_dir(self.temp_root.path())
    }

    fn account(&self) -> AccountUploader {
        AccountUploader::with_base_url(&self.client, &format!("{}/1.1/", self.server.uri())).unwrap()
    }

    fn file(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.work.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn temp_root_is_empty(&self) -> bool {
        std::fs::read_dir(self.temp_root.path()).unwrap().next().is_none()
    }

    async fn request_count(&self) -> usize {
        self.server.received_requests().await.unwrap().len()
    }

    async fn mount_init(&self, media_id: &str) {
        Mock::given(method("POST"))
            .and(path("/2/media/upload/initialize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": media_id}})))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    async fn mount_finalize(&self, media_id: &str, expected: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/2/media/upload/{media_id}/finalize")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"id": media_id, "size": 1}})),
            )
            .expect(expected)
            .mount(&self.server)
            .await;
    }
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

fn status_body(state: &str) -> serde_json::Value {
    json!({"data": {"id": "123", "processing_info": {"state": state, "check_after_secs": 0}}})
}

// ============================================================================
// Chunked Upload
// ============================================================================

#[tokio::test]
async fn test_chunked_upload_appends_every_segment() {
    let h = Harness::start().await;
    let data: Vec<u8> = (0..(2 * MIB + MIB / 2)).map(|i| (i % 253) as u8).collect();
    let file = h.file("clip.mp4", &data);

    Mock::given(method("POST"))
        .and(path("/2/media/upload/initialize"))
        .and(body_json(json!({
            "media_type": "video/mp4",
            "media_category": "tweet_video",
            "total_bytes": data.len(),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "123"}})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/media/upload/123/append"))
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&h.server)
        .await;
    h.mount_finalize("123", 1).await;

    let media = h
        .uploader()
        .chunked_upload(&file, "tweet_video", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(media["id"], "123");

    let requests = h.server.received_requests().await.unwrap();
    let mut appends: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path().ends_with("/append"))
        .collect();
    assert_eq!(appends.len(), 3);

    // Appends may arrive in any order; segment_index says where each belongs.
    appends.sort_by_key(|r| {
        (0..3)
            .find(|i| contains(&r.body, &format!("name=\"segment_index\"\r\n\r\n{i}\r\n")))
            .unwrap()
    });
    for (i, request) in appends.iter().enumerate() {
        let content_type = request.headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert!(contains(&request.body, &format!("filename=\"x00{}\"", i + 1)));
        assert!(contains(&request.body, "Content-Type: application/octet-stream"));
    }

    assert!(requests.last().unwrap().url.path().ends_with("/finalize"));
    assert!(h.temp_root_is_empty());
}

#[tokio::test]
async fn test_append_retry_succeeds_on_third_attempt() {
    let h = Harness::start().await;
    let file = h.file("photo.png", b"small image");
    h.mount_init("123").await;

    Mock::given(method("POST"))
        .and(path("/2/media/upload/123/append"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/media/upload/123/append"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;
    h.mount_finalize("123", 1).await;

    let media = h.uploader().chunked_upload(&file, "tweet_image", None).await.unwrap();
    assert!(media.is_some());
    assert!(h.temp_root_is_empty());
}

#[tokio::test]
async fn test_append_exhausted_retries_propagates() {
    let h = Harness::start().await;
    let file = h.file("photo.png", b"small image");
    h.mount_init("123").await;

    Mock::given(method("POST"))
        .and(path("/2/media/upload/123/append"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .expect(3)
        .mount(&h.server)
        .await;
    h.mount_finalize("123", 0).await;

    let err = h
        .uploader()
        .chunked_upload(&file, "tweet_image", None)
        .await
        .unwrap_err();
    let http = err.as_http().and_then(|e| e.as_http()).unwrap();
    assert_eq!(http.kind(), ErrorKind::InternalServerError);
    assert_eq!(err.to_string(), "boom");
    assert!(h.temp_root_is_empty());
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let h = Harness::start().await;
    let file = h.file("photo.png", b"small image");
    h.mount_init("123").await;

    Mock::given(method("POST"))
        .and(path("/2/media/upload/123/append"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&h.server)
        .await;
    h.mount_finalize("123", 0).await;

    let err = h
        .uploader()
        .chunked_upload(&file, "tweet_image", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_http().and_then(|e| e.as_http()).unwrap().kind(),
        ErrorKind::BadRequest
    );
    assert!(h.temp_root_is_empty());
}

#[tokio::test]
async fn test_one_failing_segment_among_many() {
    let h = Harness::start().await;
    // ASCII content keeps every append body valid UTF-8 for the body matchers.
    let data: Vec<u8> = (0..(2 * MIB + MIB / 2)).map(|i| b'a' + (i % 26) as u8).collect();
    let file = h.file("clip.mp4", &data);
    h.mount_init("123").await;

    Mock::given(method("POST"))
        .and(path("/2/media/upload/123/append"))
        .and(body_string_contains("name=\"segment_index\"\r\n\r\n1\r\n"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/media/upload/123/append"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&h.server)
        .await;
    h.mount_finalize("123", 0).await;

    let err = h
        .uploader()
        .chunked_upload(&file, "tweet_video", None)
        .await
        .unwrap_err();
    let http = err.as_http().and_then(|e| e.as_http()).unwrap();
    assert_eq!(http.kind(), ErrorKind::InternalServerError);
    assert_eq!(err.to_string(), "Internal Server Error");

    let requests = h.server.received_requests().await.unwrap();
    let appends = requests
        .iter()
        .filter(|r| r.url.path().ends_with("/append"))
        .count();
    assert_eq!(appends, 5);
    assert!(!requests.iter().any(|r| r.url.path().ends_with("/finalize")));
    assert!(h.temp_root_is_empty());
}

#[tokio::test]
async fn test_init_without_media_id() {
    let h = Harness::start().await;
    let file = h.file("photo.png", b"small image");
    Mock::given(method("POST"))
        .and(path("/2/media/upload/initialize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&h.server)
        .await;

    let err = h
        .uploader()
        .chunked_upload(&file, "tweet_image", None)
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::InvalidResponse(_)));
    assert_eq!(h.request_count().await, 1);
}

#[tokio::test]
async fn test_explicit_media_type_and_mixed_case_category() {
    let h = Harness::start().await;
    let file = h.file("photo.bin", b"abc");
    Mock::given(method("POST"))
        .and(path("/2/media/upload/initialize"))
        .and(body_json(json!({
            "media_type": "image/webp",
            "media_category": "dm_image",
            "total_bytes": 3,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 77}})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/media/upload/77/append"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;
    h.mount_finalize("77", 1).await;

    h.uploader()
        .chunked_upload(&file, "DM_Image", Some("image/webp"))
        .await
        .unwrap();
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_file_fails_before_any_request() {
    let h = Harness::start().await;
    let missing = h.work.path().join("missing.png");

    let err = h
        .uploader()
        .chunked_upload(&missing, "tweet_image", None)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, MediaError::Core(CoreError::FileNotFound(_))));
    assert!(err.to_string().starts_with("File not found: "));
    assert_eq!(h.request_count().await, 0);
}

#[tokio::test]
async fn test_invalid_category_fails_before_any_request() {
    let h = Harness::start().await;
    let file = h.file("photo.png", b"abc");

    for result in [
        h.uploader().chunked_upload(&file, "bogus", None).await,
        h.uploader().upload(&file, "bogus", None).await,
    ] {
        let err = result.unwrap_err();
        assert!(matches!(err, MediaError::Core(CoreError::InvalidArgument(_))));
        assert!(err.to_string().starts_with("Invalid media_category: bogus. Valid values: dm_gif"));
    }
    assert_eq!(h.request_count().await, 0);
}

#[tokio::test]
async fn test_zero_chunk_size_fails_before_any_request() {
    let h = Harness::start().await;
    let file = h.file("photo.png", b"abc");

    let err = h
        .uploader()
        .chunked_upload_with(&file, "tweet_image", None, 0)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(h.request_count().await, 0);
}

// ============================================================================
// Single-Shot Upload
// ============================================================================

#[tokio::test]
async fn test_single_shot_upload() {
    let h = Harness::start().await;
    let file = h.file("photo.png", b"PNGDATA");

    Mock::given(method("POST"))
        .and(path("/2/media/upload"))
        .and(body_string_contains("name=\"media_category\"\r\n\r\ntweet_image\r\n"))
        .and(body_string_contains("name=\"media_type\"\r\n\r\nimage/png\r\n"))
        .and(body_string_contains(
            "name=\"media\"; filename=\"photo.png\"\r\nContent-Type: application/octet-stream\r\n\r\nPNGDATA\r\n",
        ))
        .and(header("authorization", "Bearer TEST_BEARER_TOKEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "9"}})))
        .expect(1)
        .mount(&h.server)
        .await;

    let media = h
        .uploader()
        .upload(&file, "tweet_image", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(media["id"], "9");

    let request = &h.server.received_requests().await.unwrap()[0];
    let content_type = request.headers.get("content-type").unwrap().to_str().unwrap();
    let boundary = content_type.strip_prefix("multipart/form-data; boundary=").unwrap();
    assert!(request.body.ends_with(format!("--{boundary}--\r\n").as_bytes()));
}

// ============================================================================
// Processing
// ============================================================================

#[tokio::test]
async fn test_await_processing_stops_at_terminal_state() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/2/media/upload"))
        .and(query_param("command", "STATUS"))
        .and(query_param("media_id", "123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("in_progress")))
        .up_to_n_times(2)
        .expect(2)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/media/upload"))
        .and(query_param("command", "STATUS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("succeeded")))
        .expect(1)
        .mount(&h.server)
        .await;

    let status = h.uploader().await_processing("123").await.unwrap().unwrap();
    assert_eq!(status["processing_info"]["state"], "succeeded");
}

#[tokio::test]
async fn test_await_processing_polls_through_unrecognized_state() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/2/media/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("queued_for_review")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/media/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("succeeded")))
        .expect(1)
        .mount(&h.server)
        .await;

    let status = h.uploader().await_processing("123").await.unwrap().unwrap();
    assert_eq!(status["processing_info"]["state"], "succeeded");
}

#[tokio::test]
async fn test_await_processing_without_processing_info() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/2/media/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "123"}})))
        .expect(1)
        .mount(&h.server)
        .await;

    let status = h.uploader().await_processing("123").await.unwrap().unwrap();
    assert_eq!(status["id"], "123");
}

#[tokio::test]
async fn test_await_processing_no_content() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/2/media/upload"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    assert!(h.uploader().await_processing("123").await.unwrap().is_none());
}

#[tokio::test]
async fn test_await_processing_strict() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/2/media/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("failed")))
        .expect(2)
        .mount(&h.server)
        .await;

    let uploader = h.uploader();
    let lenient = uploader.await_processing("123").await.unwrap().unwrap();
    assert_eq!(lenient["processing_info"]["state"], "failed");

    let err = uploader.await_processing_strict("123").await.unwrap_err();
    assert_eq!(err.to_string(), "Media processing failed");
    let MediaError::ProcessingFailed { status } = err else {
        panic!("expected ProcessingFailed");
    };
    assert_eq!(status["id"], "123");
}

// ============================================================================
// Account Uploads
// ============================================================================

#[tokio::test]
async fn test_update_profile_image() {
    let h = Harness::start().await;
    let file = h.file("avatar.JPG", b"JPEGDATA");
    Mock::given(method("POST"))
        .and(path("/1.1/account/update_profile_image.json"))
        .and(body_string_contains(
            "Content-Disposition: form-data; name=\"image\"\r\nContent-Type: application/octet-stream\r\n\r\nJPEGDATA\r\n",
        ))
        .and(header("authorization", "Bearer TEST_BEARER_TOKEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"screen_name": "xdevelopers"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let user = h.account().update_profile_image(&file).await.unwrap().unwrap();
    assert_eq!(user["screen_name"], "xdevelopers");
}

#[tokio::test]
async fn test_update_profile_banner_with_options() {
    let h = Harness::start().await;
    let file = h.file("banner.png", b"PNGDATA");
    Mock::given(method("POST"))
        .and(path("/1.1/account/update_profile_banner.json"))
        .and(body_string_contains("name=\"width\"\r\n\r\n1500\r\n"))
        .and(body_string_contains("name=\"height\"\r\n\r\n500\r\n"))
        .and(body_string_contains("name=\"banner\"\r\n"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    let response = h
        .account()
        .update_profile_banner(&file, BannerOptions::default().with_size(1500, 500))
        .await
        .unwrap();
    assert!(response.is_none());

    let body = &h.server.received_requests().await.unwrap()[0].body;
    assert!(!contains(body, "offset_left"));
    let width = body.windows(5).position(|w| w == b"width").unwrap();
    let banner = body.windows(6).position(|w| w == b"banner").unwrap();
    assert!(width < banner);
}

#[tokio::test]
async fn test_banner_binary_with_offsets() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/1.1/account/update_profile_banner.json"))
        .and(body_string_contains("name=\"offset_left\"\r\n\r\n10\r\n"))
        .and(body_string_contains("name=\"offset_top\"\r\n\r\n20\r\n"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    h.account()
        .upload_profile_banner_binary(b"raw", BannerOptions::default().with_offset(10, 20))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_profile_image_validation() {
    let h = Harness::start().await;
    let webp = h.file("avatar.webp", b"data");
    let missing = Path::new("/nonexistent/avatar.png");

    let err = h.account().update_profile_image(&webp).await.unwrap_err();
    assert!(matches!(err, MediaError::Core(CoreError::InvalidMediaType(_))));
    assert!(err.to_string().contains("Supported types: gif, jpg, jpeg, png"));

    let err = h
        .account()
        .update_profile_banner(missing, BannerOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::Core(CoreError::FileNotFound(_))));

    assert_eq!(h.request_count().await, 0);
}

#[test]
fn test_default_account_root() {
    let client = Client::with_credentials(Credentials::bearer("t")).unwrap();
    let account = AccountUploader::new(&client).unwrap();
    assert_eq!(account.client().base_url().as_str(), crate::V1_BASE_URL);
    assert_eq!(client.base_url().as_str(), "https://api.twitter.com/2/");
}
