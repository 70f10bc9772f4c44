//! Image generation module.

mod client;
mod payload;
mod provider;
pub mod providers;
mod types;

pub use client::{ImageClient, ImageClientBuilder, DEFAULT_BASE_URL};
pub use payload::{
    decode_base64, decode_data_uri, extract_from_message, ChatMessage, ContentPart, Generation,
    ImageEntry, ImagePayload, MessageContent, UrlField,
};
pub use provider::{ImageProvider, Route};
pub use types::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, DEFAULT_MODEL,
    DEFAULT_SIZE,
};
