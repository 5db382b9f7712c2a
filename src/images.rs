//! Image storage — turns a picked local file into a string a row can hold.
//!
//! DESIGN
//! ======
//! [`ImageStore`] is the upload contract: it takes an [`ImageFile`] and
//! returns a reference to put on the draft. [`InlineImages`] encodes the
//! bytes as a `data:` URL so the row carries the image itself.
//! [`BucketImages`] uploads to the backend's object storage and returns the
//! public URL, keeping rows small.

use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use url::Url;
use uuid::Uuid;

use crate::auth::TokenSource;
use crate::config::HttpTimeouts;
use crate::error::{ErrorCode, Severity};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("could not read image {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("unsupported image type: {0}")]
    Unsupported(String),
    #[error("image upload failed: {0}")]
    Upload(String),
    #[error("storage rejected upload (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ImageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "E_IMAGE_READ",
            Self::Unsupported(_) => "E_IMAGE_UNSUPPORTED",
            Self::Upload(_) => "E_IMAGE_UPLOAD",
            Self::Api { .. } => "E_IMAGE_API",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn severity(&self) -> Severity {
        match self {
            Self::Read { .. } | Self::Unsupported(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

// =============================================================================
// IMAGE FILE
// =============================================================================

/// Raw bytes of a picked image plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Read a local file. Blocking; files are small and picked by hand.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a known image
    /// type.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ImageError::Read { path: path.display().to_string(), reason: e.to_string() })?;
        let extension = path.extension().and_then(|e| e.to_str());
        Self::from_bytes(bytes, extension)
    }

    /// Wrap bytes already in memory. The MIME type is sniffed from the
    /// content first and the extension second.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Unsupported`] when neither identifies an image.
    pub fn from_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<Self, ImageError> {
        let mime = sniff_mime(&bytes)
            .or_else(|| extension.and_then(mime_for_extension))
            .ok_or_else(|| ImageError::Unsupported(extension.unwrap_or("unknown").to_owned()))?;
        Ok(Self { mime, bytes })
    }

    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "jpg",
        }
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `image` under `folder` and return the string to store on the
    /// row (a `data:` URL or a public URL).
    async fn store(&self, folder: &str, image: &ImageFile) -> Result<String, ImageError>;
}

/// Keeps images inside the row as `data:` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineImages;

#[async_trait::async_trait]
impl ImageStore for InlineImages {
    async fn store(&self, _folder: &str, image: &ImageFile) -> Result<String, ImageError> {
        Ok(image.to_data_url())
    }
}

// =============================================================================
// BUCKET UPLOADS
// =============================================================================

/// Uploads to `/storage/v1/object/{bucket}/{path}` and returns the public
/// object URL.
pub struct BucketImages {
    http: reqwest::Client,
    base_url: Url,
    bucket: String,
    tokens: TokenSource,
}

impl BucketImages {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, bucket: impl Into<String>, tokens: TokenSource, timeouts: HttpTimeouts) -> Result<Self, ImageError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ImageError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, bucket: bucket.into(), tokens })
    }
}

#[async_trait::async_trait]
impl ImageStore for BucketImages {
    async fn store(&self, folder: &str, image: &ImageFile) -> Result<String, ImageError> {
        let path = object_path(folder, Uuid::new_v4(), image.extension());
        let upload = object_url(&self.base_url, &["object", &self.bucket], &path)?;

        let response = self
            .http
            .post(upload)
            .header("apikey", self.tokens.anon_key())
            .bearer_auth(self.tokens.bearer())
            .header(reqwest::header::CONTENT_TYPE, image.mime)
            .header("x-upsert", "true")
            .body(image.bytes.clone())
            .send()
            .await
            .map_err(|e| ImageError::Upload(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::Api { status, message: body });
        }

        tracing::info!(bucket = %self.bucket, %path, bytes = image.bytes.len(), "image uploaded");
        let public = object_url(&self.base_url, &["object", "public", &self.bucket], &path)?;
        Ok(public.to_string())
    }
}

/// `{folder}/{id}.{ext}`, with the folder's slashes trimmed.
fn object_path(folder: &str, id: Uuid, extension: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{id}.{extension}")
    } else {
        format!("{folder}/{id}.{extension}")
    }
}

fn object_url(base: &Url, prefix: &[&str], path: &str) -> Result<Url, ImageError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ImageError::Upload(format!("invalid base url: {base}")))?
        .pop_if_empty()
        .extend(["storage", "v1"])
        .extend(prefix)
        .extend(path.split('/'));
    Ok(url)
}

#[cfg(test)]
#[path = "images_test.rs"]
mod tests;
