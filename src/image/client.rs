//! Client that routes a request to the right provider and resolves the
//! image it returns.

use crate::config::API_KEY_VAR;
use crate::error::{ImageGenError, Result};
use crate::image::payload::{decode_base64, decode_data_uri, is_data_uri, is_remote_url, ImagePayload};
use crate::image::provider::{ImageProvider, Route};
use crate::image::providers::{ChatCompletionProvider, ImageGenerationProvider, Transport};
use crate::image::types::{GeneratedImage, GenerationMetadata, GenerationRequest};
use secrecy::SecretString;
use std::time::Instant;

/// OpenRouter's OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Builder for [`ImageClient`].
#[derive(Debug, Clone, Default)]
pub struct ImageClientBuilder {
    api_key: Option<SecretString>,
    base_url: Option<String>,
    http_client: Option<reqwest::Client>,
}

impl ImageClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `OPENROUTER_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Overrides the API base URL (default: [`DEFAULT_BASE_URL`]).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Uses a preconfigured HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<ImageClient> {
        let api_key = self
            .api_key
            .or_else(|| {
                std::env::var(API_KEY_VAR)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .map(SecretString::from)
            })
            .ok_or_else(|| {
                ImageGenError::Config(format!("{API_KEY_VAR} not set and no API key provided"))
            })?;

        Ok(ImageClient {
            transport: Transport::new(
                self.http_client.unwrap_or_default(),
                self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                api_key,
            ),
        })
    }
}

/// Generates images through whichever endpoint the model requires.
#[derive(Debug, Clone)]
pub struct ImageClient {
    transport: Transport,
}

impl ImageClient {
    /// Creates a new `ImageClientBuilder`.
    pub fn builder() -> ImageClientBuilder {
        ImageClientBuilder::new()
    }

    /// Returns the provider implementing `route`.
    pub fn provider(&self, route: Route) -> Box<dyn ImageProvider> {
        match route {
            Route::ImageGeneration => {
                Box::new(ImageGenerationProvider::new(self.transport.clone()))
            }
            Route::ChatCompletion => Box::new(ChatCompletionProvider::new(self.transport.clone())),
        }
    }

    /// Generates one image for `request`.
    ///
    /// The request is validated before anything is sent.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        request.validate()?;
        let start = Instant::now();

        let route = request.route();
        let provider = self.provider(route);
        tracing::debug!(provider = provider.name(), model = %request.model, "generating image");

        let generation = provider.generate(request).await?;
        let data = self.resolve_payload(&generation.payload).await?;

        Ok(GeneratedImage::new(
            data,
            generation.caption,
            GenerationMetadata {
                model: request.model.clone(),
                route,
                duration_ms: Some(start.elapsed().as_millis() as u64),
            },
        ))
    }

    /// Turns a located image into bytes, decoding inline data or downloading
    /// a referenced URL.
    pub async fn resolve_payload(&self, payload: &ImagePayload) -> Result<Vec<u8>> {
        match payload {
            ImagePayload::DirectBinary(b64) => decode_base64(b64),
            ImagePayload::DirectUrl(url) => self.transport.fetch(url).await,
            ImagePayload::ChatInline(value) if is_data_uri(value) => decode_data_uri(value),
            ImagePayload::ChatInline(value) if is_remote_url(value) => {
                self.transport.fetch(value).await
            }
            ImagePayload::ChatInline(value) => decode_base64(value),
            ImagePayload::ChatUrl(url) | ImagePayload::ContentList(url) => {
                if is_data_uri(url) {
                    decode_data_uri(url)
                } else {
                    self.transport.fetch(url).await
                }
            }
        }
    }
}
