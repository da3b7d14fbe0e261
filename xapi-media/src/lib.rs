// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # xapi Media
//!
//! Upload workflows for the X API.
//!
//! - [`MediaUploader`] - single-shot and chunked uploads to `media/upload`,
//!   plus polling for server-side processing
//! - [`AccountUploader`] - profile image and banner updates on the v1.1 API
//!
//! Chunked uploads split the source into temporary segment files, append
//! them concurrently with bounded per-segment retries, and finalize once
//! every append has finished. Segment files are deleted whether or not
//! the upload succeeds.
//!
//! ## Example
//!
//! ```ignore
//! use std::path::Path;
//! use xapi_core::{Credentials, MediaCategory};
//! use xapi_http::Client;
//! use xapi_media::MediaUploader;
//!
//! let client = Client::with_credentials(Credentials::oauth1("key", "secret", "token", "token_secret"))?;
//! let uploader = MediaUploader::new(client);
//! let media = uploader
//!     .chunked_upload(Path::new("clip.mp4"), MediaCategory::TweetVideo.as_str(), None)
//!     .await?;
//! ```

pub mod account;
pub mod error;
pub mod multipart;
pub mod segments;
pub mod uploader;

#[cfg(test)]
mod uploader_tests;

pub use account::{AccountUploader, BannerOptions, V1_BASE_URL};
pub use error::MediaError;
pub use multipart::Multipart;
pub use segments::TempSegment;
pub use uploader::{MAX_RETRIES, MediaUploader};
