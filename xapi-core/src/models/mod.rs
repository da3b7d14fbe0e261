//! Domain models for the X API client.
//!
//! ## Submodules
//!
//! - [`credentials`] - Credential fields and auth mode selection
//! - [`rate_limit`] - Rate-limit windows parsed from response headers
//! - [`media`] - Media categories, MIME inference, upload sessions
//! - [`processing`] - Post-finalize processing status

pub mod credentials;
pub mod media;
pub mod processing;
pub mod rate_limit;

pub use credentials::{AuthMode, Credentials};
pub use media::{
    DEFAULT_CHUNK_SIZE_MB, DEFAULT_MIME_TYPE, MediaCategory, UploadSession, chunk_size_bytes,
    infer_media_type, media_type_for_extension, segment_count, validate_profile_image,
};
pub use processing::{ProcessingState, ProcessingStatus};
pub use rate_limit::{KNOWN_RATE_LIMIT_TYPES, RateLimit, RateLimits};
