//! Image provider trait and endpoint routing.

use crate::error::Result;
use crate::image::payload::Generation;
use crate::image::types::GenerationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Remote endpoint a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// `/images/generations`, returning base64 or a URL directly.
    ImageGeneration,
    /// `/chat/completions`, with the image embedded in the reply message.
    ChatCompletion,
}

impl Route {
    /// Model identifiers containing this marker use the image-generation
    /// endpoint.
    pub const IMAGE_GENERATION_FAMILY: &'static str = "dall-e";

    /// Picks the endpoint for a model identifier.
    pub fn for_model(model: &str) -> Self {
        if model
            .to_ascii_lowercase()
            .contains(Self::IMAGE_GENERATION_FAMILY)
        {
            Self::ImageGeneration
        } else {
            Self::ChatCompletion
        }
    }

    /// Path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::ImageGeneration => "images/generations",
            Self::ChatCompletion => "chat/completions",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImageGeneration => write!(f, "image-generation"),
            Self::ChatCompletion => write!(f, "chat-completion"),
        }
    }
}

/// One calling convention for producing an image.
///
/// A provider performs the API call and reports where the image is; turning
/// an [`ImagePayload`](crate::image::ImagePayload) into bytes is left to
/// [`ImageClient`](crate::ImageClient).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Calls the endpoint and locates the image in its response.
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation>;

    /// Returns the endpoint this provider calls.
    fn route(&self) -> Route;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        match self.route() {
            Route::ImageGeneration => "image generation",
            Route::ChatCompletion => "chat completion",
        }
    }
}
