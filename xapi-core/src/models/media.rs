//! Media categories, MIME inference and upload session state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::CoreError;

/// Fallback MIME type for unrecognized files.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Default chunk size for segmented uploads, in megabytes.
pub const DEFAULT_CHUNK_SIZE_MB: u64 = 1;

const BYTES_PER_MB: u64 = 1_048_576;

// ============================================================================
// Media Category
// ============================================================================

/// Where uploaded media will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    /// Animated GIF in a direct message.
    DmGif,
    /// Still image in a direct message.
    DmImage,
    /// Video in a direct message.
    DmVideo,
    /// SubRip subtitle track.
    Subtitles,
    /// Animated GIF in a post.
    TweetGif,
    /// Still image in a post.
    TweetImage,
    /// Video in a post.
    TweetVideo,
}

impl MediaCategory {
    /// Every category the upload endpoints accept.
    pub const ALL: [MediaCategory; 7] = [
        MediaCategory::DmGif,
        MediaCategory::DmImage,
        MediaCategory::DmVideo,
        MediaCategory::Subtitles,
        MediaCategory::TweetGif,
        MediaCategory::TweetImage,
        MediaCategory::TweetVideo,
    ];

    /// Wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DmGif => "dm_gif",
            Self::DmImage => "dm_image",
            Self::DmVideo => "dm_video",
            Self::Subtitles => "subtitles",
            Self::TweetGif => "tweet_gif",
            Self::TweetImage => "tweet_image",
            Self::TweetVideo => "tweet_video",
        }
    }

    /// MIME type implied by the category alone, if any.
    pub fn implied_media_type(self) -> Option<&'static str> {
        match self {
            Self::DmGif | Self::TweetGif => Some("image/gif"),
            Self::DmVideo | Self::TweetVideo => Some("video/mp4"),
            Self::Subtitles => Some("application/x-subrip"),
            Self::DmImage | Self::TweetImage => None,
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                CoreError::InvalidArgument(format!(
                    "Invalid media_category: {s}. Valid values: {}",
                    valid.join(", ")
                ))
            })
    }
}

// ============================================================================
// MIME Inference
// ============================================================================

/// Infers the MIME type for an upload.
///
/// The category wins when it implies a type; otherwise the file extension
/// decides, falling back to [`DEFAULT_MIME_TYPE`].
pub fn infer_media_type(path: &Path, category: MediaCategory) -> &'static str {
    if let Some(implied) = category.implied_media_type() {
        return implied;
    }
    media_type_for_extension(path).unwrap_or(DEFAULT_MIME_TYPE)
}

/// MIME type for a known file extension.
pub fn media_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "gif" => Some("image/gif"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "mp4" => Some("video/mp4"),
        "png" => Some("image/png"),
        "srt" => Some("application/x-subrip"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Extensions accepted for profile images and banners.
pub const PROFILE_IMAGE_EXTENSIONS: [&str; 4] = ["gif", "jpg", "jpeg", "png"];

/// Checks that a file is an acceptable profile image or banner.
pub fn validate_profile_image(path: &Path) -> Result<(), CoreError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if PROFILE_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(CoreError::InvalidMediaType(format!(
            "Unsupported image type: {}. Supported types: {}",
            if ext.is_empty() { "(none)" } else { ext.as_str() },
            PROFILE_IMAGE_EXTENSIONS.join(", ")
        )))
    }
}

// ============================================================================
// Upload Session
// ============================================================================

/// State shared by the append tasks of one chunked upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
    /// Server-assigned media ID.
    pub media_id: String,
    /// Size of the source file.
    pub total_bytes: u64,
    /// Bytes per segment.
    pub chunk_size: u64,
    /// Number of segments, `ceil(total_bytes / chunk_size)`.
    pub segment_count: u64,
}

impl UploadSession {
    /// Creates a session for a file of `total_bytes` split at `chunk_size`.
    pub fn new(media_id: impl Into<String>, total_bytes: u64, chunk_size: u64) -> Self {
        Self {
            media_id: media_id.into(),
            total_bytes,
            chunk_size,
            segment_count: segment_count(total_bytes, chunk_size),
        }
    }
}

/// Converts a segment size in megabytes to bytes.
pub fn chunk_size_bytes(chunk_size_mb: u64) -> Result<u64, CoreError> {
    if chunk_size_mb == 0 {
        return Err(CoreError::InvalidArgument(
            "chunk_size_mb must be greater than 0".to_string(),
        ));
    }
    chunk_size_mb
        .checked_mul(BYTES_PER_MB)
        .ok_or_else(|| CoreError::InvalidArgument(format!("chunk_size_mb too large: {chunk_size_mb}")))
}

/// Number of segments needed for `total_bytes` at `chunk_size` each.
pub fn segment_count(total_bytes: u64, chunk_size: u64) -> u64 {
    if chunk_size == 0 {
        return 0;
    }
    total_bytes.div_ceil(chunk_size)
}
