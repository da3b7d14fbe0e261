//! Media uploads against the v2 `media/upload` endpoints.
//!
//! A chunked upload runs `initialize`, then one concurrent `append` per
//! segment, then `finalize`. Video and GIF uploads may need
//! [`MediaUploader::await_processing`] before the media can be attached.

use futures::future::join_all;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use xapi_core::{
    CoreError, DEFAULT_CHUNK_SIZE_MB, MediaCategory, ProcessingState, ProcessingStatus, UploadSession,
    chunk_size_bytes, infer_media_type,
};
use xapi_http::{Client, HttpMethod, RetryPolicy};

use crate::error::MediaError;
use crate::multipart::Multipart;
use crate::segments::{TempSegment, split};

/// Attempts per segment append, counting the first.
pub const MAX_RETRIES: u32 = 3;

/// Poll interval used when a status omits `check_after_secs`.
pub const DEFAULT_CHECK_AFTER_SECS: u64 = 1;

/// Uploads media through a [`Client`].
#[derive(Debug, Clone)]
pub struct MediaUploader {
    client: Client,
    retry: RetryPolicy,
    temp_dir: PathBuf,
}

impl MediaUploader {
    /// Creates an uploader that writes segments under the system temp dir.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::new(MAX_RETRIES),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Sets the retry policy for segment appends.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets where segment files are written.
    #[must_use]
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// The client requests go through.
    pub fn client(&self) -> &Client {
        &self.client
    }

    // ========================================================================
    // Uploads
    // ========================================================================

    /// Uploads a file in a single multipart request.
    ///
    /// `media_type` defaults to the type inferred from the category and
    /// extension. Returns the `data` member of the response.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload(
        &self,
        path: &Path,
        media_category: &str,
        media_type: Option<&str>,
    ) -> Result<Option<Value>, MediaError> {
        let category = validate(path, media_category).await?;
        let media_type = media_type.unwrap_or_else(|| infer_media_type(path, category));
        let content = tokio::fs::read(path).await?;

        let form = Multipart::new()
            .text("media_category", category)
            .text("media_type", media_type)
            .bytes("media", Some(&file_name(path)), &content);
        let headers = form.headers()?;

        let response = self
            .client
            .request(HttpMethod::Post, "media/upload", Some(form.finish()), &headers)
            .await?;
        info!(media_type, "Media uploaded");
        Ok(data(response))
    }

    /// Uploads a file with the chunked protocol, 1 MB per segment.
    pub async fn chunked_upload(
        &self,
        path: &Path,
        media_category: &str,
        media_type: Option<&str>,
    ) -> Result<Option<Value>, MediaError> {
        self.chunked_upload_with(path, media_category, media_type, DEFAULT_CHUNK_SIZE_MB)
            .await
    }

    /// Uploads a file with the chunked protocol and a custom segment size.
    ///
    /// Validation runs before any request. All appends finish before
    /// finalize is sent; if any segment still fails after its retries, its
    /// error is returned and finalize is skipped. Segment files are removed
    /// in every case.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn chunked_upload_with(
        &self,
        path: &Path,
        media_category: &str,
        media_type: Option<&str>,
        chunk_size_mb: u64,
    ) -> Result<Option<Value>, MediaError> {
        let category = validate(path, media_category).await?;
        let chunk_size = chunk_size_bytes(chunk_size_mb)?;
        let media_type = media_type.unwrap_or_else(|| infer_media_type(path, category));
        let total_bytes = tokio::fs::metadata(path).await?.len();

        let media_id = self.init(media_type, category, total_bytes).await?;
        let session = UploadSession::new(media_id, total_bytes, chunk_size);
        debug!(
            media_id = %session.media_id,
            segments = session.segment_count,
            "Upload session initialized"
        );

        let segments = split(path, session.chunk_size, &self.temp_dir).await?;
        self.append(&session.media_id, segments).await?;

        let media = self.finalize(&session.media_id).await?;
        info!(media_id = %session.media_id, total_bytes, "Chunked upload finalized");
        Ok(media)
    }

    // ========================================================================
    // Protocol Steps
    // ========================================================================

    /// Opens an upload session and returns its media ID.
    pub async fn init(
        &self,
        media_type: &str,
        media_category: MediaCategory,
        total_bytes: u64,
    ) -> Result<String, MediaError> {
        let body = json!({
            "media_type": media_type,
            "media_category": media_category,
            "total_bytes": total_bytes,
        });
        let response = self
            .client
            .post("media/upload/initialize", Some(body.to_string()))
            .await?;

        data(response)
            .as_ref()
            .and_then(media_id)
            .ok_or_else(|| MediaError::InvalidResponse("initialize returned no media id".to_string()))
    }

    /// Appends every segment concurrently, one task per segment.
    ///
    /// Waits for all tasks, then returns the first failure in segment order.
    pub async fn append(&self, media_id: &str, segments: Vec<TempSegment>) -> Result<(), MediaError> {
        let tasks = segments
            .into_iter()
            .map(|segment| self.append_segment(media_id, segment));

        join_all(tasks).await.into_iter().collect()
    }

    /// Completes an upload session.
    pub async fn finalize(&self, media_id: &str) -> Result<Option<Value>, MediaError> {
        let response = self
            .client
            .post(&format!("media/upload/{media_id}/finalize"), None)
            .await?;
        Ok(data(response))
    }

    /// Fetches the processing status of an upload.
    pub async fn status(&self, media_id: &str) -> Result<Option<Value>, MediaError> {
        let response = self
            .client
            .get(&format!("media/upload?command=STATUS&media_id={media_id}"))
            .await?;
        Ok(data(response))
    }

    /// Polls until processing reaches a terminal state.
    ///
    /// Returns the last status body. A status without `processing_info`
    /// counts as terminal, and a 204 ends polling with `None`. Unrecognized
    /// states are polled again like `in_progress`.
    #[instrument(skip(self))]
    pub async fn await_processing(&self, media_id: &str) -> Result<Option<Value>, MediaError> {
        loop {
            let Some(status) = self.status(media_id).await? else {
                return Ok(None);
            };

            let processing = match ProcessingStatus::from_media(&status) {
                Some(processing) if !processing.is_terminal() => processing,
                _ => return Ok(Some(status)),
            };

            let wait = processing.check_after_secs.unwrap_or(DEFAULT_CHECK_AFTER_SECS);
            if processing.state == ProcessingState::Unknown {
                warn!(media_id, "Unrecognized processing state, polling again");
            }
            debug!(
                state = ?processing.state,
                progress = ?processing.progress_percent,
                wait_secs = wait,
                "Media still processing"
            );
            tokio::time::sleep(Duration::from_secs(wait)).await;
        }
    }

    /// Like [`Self::await_processing`], but a `failed` state is an error.
    pub async fn await_processing_strict(&self, media_id: &str) -> Result<Option<Value>, MediaError> {
        let status = self.await_processing(media_id).await?;
        if let Some(ref body) = status {
            let failed = ProcessingStatus::from_media(body)
                .is_some_and(|processing| processing.state == ProcessingState::Failed);
            if failed {
                return Err(MediaError::ProcessingFailed { status: body.clone() });
            }
        }
        Ok(status)
    }

    async fn append_segment(&self, media_id: &str, segment: TempSegment) -> Result<(), MediaError> {
        let content = segment.read().await?;
        let form = Multipart::new()
            .text("segment_index", segment.index())
            .bytes("media", Some(segment.file_name()), &content);
        let headers = form.headers()?;
        let body = form.finish();
        let endpoint = format!("media/upload/{media_id}/append");

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self
                .client
                .request(HttpMethod::Post, &endpoint, Some(body.clone()), &headers)
                .await
            {
                Ok(_) => {
                    debug!(segment = segment.index(), attempts, "Segment appended");
                    return Ok(());
                }
                Err(e) if self.retry.should_retry(&e) && self.retry.has_attempts_left(attempts) => {
                    warn!(segment = segment.index(), attempts, error = %e, "Segment append failed, retrying");
                    tokio::time::sleep(self.retry.delay_for_attempt(attempts)).await;
                }
                Err(e) => {
                    warn!(segment = segment.index(), attempts, error = %e, "Segment append failed");
                    return Err(e.into());
                }
            }
        }
    }
}

/// Checks the file and category before anything is sent.
async fn validate(path: &Path, media_category: &str) -> Result<MediaCategory, MediaError> {
    let exists = tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file());
    if !exists {
        return Err(CoreError::FileNotFound(path.display().to_string()).into());
    }
    Ok(media_category.parse::<MediaCategory>()?)
}

fn data(response: Option<Value>) -> Option<Value> {
    response.and_then(|mut body| body.get_mut("data").map(Value::take))
}

fn media_id(media: &Value) -> Option<String> {
    match media.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
