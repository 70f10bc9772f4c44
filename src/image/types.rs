//! Core types for image generation.

use crate::error::{ImageGenError, Result};
use crate::image::provider::Route;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Model used when none is given.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-image-preview";

/// Size used by the image-generation endpoint when none is given.
pub const DEFAULT_SIZE: &str = "1024x1024";

/// Image formats recognized when reporting what was saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A request to generate an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Model identifier; also decides which endpoint is called.
    pub model: String,
    /// `WIDTHxHEIGHT`, sent only to the image-generation endpoint.
    pub size: String,
}

impl GenerationRequest {
    /// Creates a new request with the given prompt and default model/size.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_MODEL.to_string(),
            size: DEFAULT_SIZE.to_string(),
        }
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the size string (e.g. `1792x1024`).
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Returns the endpoint this request will be sent to.
    pub fn route(&self) -> Route {
        Route::for_model(&self.model)
    }

    /// Rejects requests that must not reach the network.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(ImageGenError::InvalidRequest("prompt must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ImageGenError::InvalidRequest("model must not be empty".into()));
        }
        Ok(())
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: String,
    /// Endpoint that produced the image.
    pub route: Route,
    /// Generation duration in milliseconds, follow-up fetches included.
    pub duration_ms: Option<u64>,
}

/// A generated image with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Raw image bytes, exactly as decoded or downloaded.
    pub data: Vec<u8>,
    /// Text returned alongside the image (chat caption or revised prompt).
    pub caption: Option<String>,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(data: Vec<u8>, caption: Option<String>, metadata: GenerationMetadata) -> Self {
        Self {
            data,
            caption,
            metadata,
        }
    }

    /// Returns the format detected from magic bytes, if any.
    pub fn detected_format(&self) -> Option<ImageFormat> {
        ImageFormat::from_magic_bytes(&self.data)
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}
