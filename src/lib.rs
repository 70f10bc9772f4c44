#![warn(missing_docs)]
//! imagegen - generate an image from a text prompt.
//!
//! Models are served over an OpenAI-compatible API through one of two
//! calling conventions: the image-generation endpoint (DALL-E family) or the
//! chat-completion endpoint, where image-capable chat models attach the
//! generated image to the reply. [`ImageClient`] picks the convention from
//! the model identifier and returns the raw image bytes.
//!
//! # Quick Start
//!
//! ```no_run
//! use imagegen::{Credential, GenerationRequest, ImageClient};
//! use secrecy::ExposeSecret;
//!
//! #[tokio::main]
//! async fn main() -> imagegen::Result<()> {
//!     let credential = Credential::load()?;
//!     let client = ImageClient::builder()
//!         .api_key(credential.api_key().expose_secret())
//!         .build()?;
//!     let request = GenerationRequest::new("A golden retriever puppy");
//!     let image = client.generate(&request).await?;
//!     image.save("puppy.png")?;
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod image;

// Re-export error types at crate root
pub use error::{sanitize_error_message, truncate_preview, ImageGenError, Result, PREVIEW_CHARS};

pub use config::{default_credential_path, Credential, API_KEY_VAR};

pub use image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageClient, ImageClientBuilder,
    ImageFormat, ImagePayload, ImageProvider, Route,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::Credential;
    pub use crate::error::{ImageGenError, Result};
    pub use crate::image::{GeneratedImage, GenerationRequest, ImageClient, ImageProvider};
}
