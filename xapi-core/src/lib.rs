// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # xapi Core
//!
//! Data model for the X API client. Nothing in this crate performs I/O.
//!
//! ## Key Types
//!
//! ### Authentication
//! - [`Credentials`] - OAuth 1.0a, OAuth 2.0 and bearer credential fields
//! - [`AuthMode`] - Which credential set is active
//!
//! ### Responses
//! - [`RateLimit`] / [`RateLimits`] - Quota windows from `x-*-limit` headers
//!
//! ### Media
//! - [`MediaCategory`] - Upload categories accepted by the API
//! - [`UploadSession`] - Chunked upload bookkeeping
//! - [`ProcessingStatus`] - Server-side transcoding state
//!
//! ### Errors
//! - [`CoreError`] - Local validation failures raised before any request

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{
    // Authentication
    AuthMode,
    Credentials,
    // Rate limits
    KNOWN_RATE_LIMIT_TYPES,
    RateLimit,
    RateLimits,
    // Media
    DEFAULT_CHUNK_SIZE_MB,
    DEFAULT_MIME_TYPE,
    MediaCategory,
    UploadSession,
    chunk_size_bytes,
    infer_media_type,
    media_type_for_extension,
    segment_count,
    validate_profile_image,
    // Processing
    ProcessingState,
    ProcessingStatus,
};
