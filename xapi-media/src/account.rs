//! Profile image and banner uploads.
//!
//! These live on the v1.1 API, so the uploader talks to a copy of the
//! caller's client rooted at [`V1_BASE_URL`].

use serde_json::Value;
use std::path::Path;
use tracing::{info, instrument};
use xapi_core::{CoreError, validate_profile_image};
use xapi_http::{Client, HttpMethod};

use crate::error::MediaError;
use crate::multipart::Multipart;

/// Root of the v1.1 account endpoints.
pub const V1_BASE_URL: &str = "https://api.x.com/1.1/";

/// Optional banner cropping, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BannerOptions {
    /// Width of the preferred section of the image.
    pub width: Option<u32>,
    /// Height of the preferred section of the image.
    pub height: Option<u32>,
    /// Pixels to skip from the left edge.
    pub offset_left: Option<u32>,
    /// Pixels to skip from the top edge.
    pub offset_top: Option<u32>,
}

impl BannerOptions {
    /// Sets width and height.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets the left and top offsets.
    #[must_use]
    pub fn with_offset(mut self, left: u32, top: u32) -> Self {
        self.offset_left = Some(left);
        self.offset_top = Some(top);
        self
    }
}

/// Updates the authenticating user's profile media.
#[derive(Debug, Clone)]
pub struct AccountUploader {
    client: Client,
}

impl AccountUploader {
    /// Creates an uploader using `client`'s credentials against the v1.1 API.
    pub fn new(client: &Client) -> Result<Self, MediaError> {
        Self::with_base_url(client, V1_BASE_URL)
    }

    /// Creates an uploader against a different v1.1 root.
    pub fn with_base_url(client: &Client, base_url: &str) -> Result<Self, MediaError> {
        Ok(Self {
            client: client.with_base_url(base_url)?,
        })
    }

    /// The v1.1 client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Replaces the profile image with a file.
    pub async fn update_profile_image(&self, path: &Path) -> Result<Option<Value>, MediaError> {
        validate_file(path).await?;
        let content = tokio::fs::read(path).await?;
        self.upload_profile_image_binary(&content).await
    }

    /// Replaces the profile image with raw image bytes.
    ///
    /// Returns the updated user object.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn upload_profile_image_binary(&self, content: &[u8]) -> Result<Option<Value>, MediaError> {
        let form = Multipart::new().bytes("image", None, content);
        let user = self.send("account/update_profile_image.json", form).await?;
        info!("Profile image updated");
        Ok(user)
    }

    /// Replaces the profile banner with a file.
    pub async fn update_profile_banner(
        &self,
        path: &Path,
        options: BannerOptions,
    ) -> Result<Option<Value>, MediaError> {
        validate_file(path).await?;
        let content = tokio::fs::read(path).await?;
        self.upload_profile_banner_binary(&content, options).await
    }

    /// Replaces the profile banner with raw image bytes.
    ///
    /// The endpoint answers with no content, so success is usually `None`.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn upload_profile_banner_binary(
        &self,
        content: &[u8],
        options: BannerOptions,
    ) -> Result<Option<Value>, MediaError> {
        let form = Multipart::new()
            .text_opt("width", options.width)
            .text_opt("height", options.height)
            .text_opt("offset_left", options.offset_left)
            .text_opt("offset_top", options.offset_top)
            .bytes("banner", None, content);
        let response = self.send("account/update_profile_banner.json", form).await?;
        info!("Profile banner updated");
        Ok(response)
    }

    async fn send(&self, endpoint: &str, form: Multipart) -> Result<Option<Value>, MediaError> {
        let headers = form.headers()?;
        Ok(self
            .client
            .request(HttpMethod::Post, endpoint, Some(form.finish()), &headers)
            .await?)
    }
}

async fn validate_file(path: &Path) -> Result<(), MediaError> {
    let exists = tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file());
    if !exists {
        return Err(CoreError::FileNotFound(path.display().to_string()).into());
    }
    Ok(validate_profile_image(path)?)
}
