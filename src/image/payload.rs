//! Where an image lives in an API response, and how to decode it.

use crate::error::{ImageGenError, Result};
use base64::Engine;
use serde::Deserialize;

/// Location of the generated image within a response.
///
/// Every response shape either endpoint can produce maps onto exactly one
/// variant; [`ImageClient::resolve_payload`](crate::ImageClient::resolve_payload)
/// is the only place that turns a variant into bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// `data[0].b64_json` from the image-generation endpoint.
    DirectBinary(String),
    /// `data[0].url` from the image-generation endpoint.
    DirectUrl(String),
    /// String entry of `message.images`: a data URI or bare base64.
    ChatInline(String),
    /// Object entry of `message.images`: a data URI or external URL.
    ChatUrl(String),
    /// Image-tagged element of `message.content`: a data URI or external URL.
    ContentList(String),
}

impl ImagePayload {
    /// Short label for logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DirectBinary(_) => "direct-binary",
            Self::DirectUrl(_) => "direct-url",
            Self::ChatInline(_) => "chat-embedded-inline",
            Self::ChatUrl(_) => "chat-embedded-url",
            Self::ContentList(_) => "chat-content-list",
        }
    }
}

/// Outcome of a provider call: the image location plus any accompanying text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Where the image is.
    pub payload: ImagePayload,
    /// Caption or revised prompt returned alongside the image.
    pub caption: Option<String>,
}

/// Assistant message from a chat-completion response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessage {
    /// Plain text or a list of typed parts.
    #[serde(default)]
    pub content: Option<MessageContent>,
    /// Generated images, as attached by image-capable chat models.
    #[serde(default)]
    pub images: Option<Vec<ImageEntry>>,
}

/// `message.content` in either of its two shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Typed parts (text, image_url, ...).
    Parts(Vec<ContentPart>),
}

/// One element of a structured `message.content` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    /// An object with a `type` tag.
    Typed {
        /// The `type` tag, e.g. `text` or `image_url`.
        #[serde(rename = "type")]
        kind: String,
        /// Text of a `text` part.
        #[serde(default)]
        text: Option<String>,
        /// Reference of an `image_url` part.
        #[serde(default)]
        image_url: Option<UrlField>,
    },
    /// Anything else; ignored.
    Other(serde_json::Value),
}

/// One element of `message.images`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageEntry {
    /// A data URI or bare base64 string.
    Plain(String),
    /// `{"type": "image_url", "image_url": {"url": ...}}` or `{"url": ...}`.
    Object {
        /// Nested reference.
        #[serde(default)]
        image_url: Option<UrlField>,
        /// Flat reference.
        #[serde(default)]
        url: Option<String>,
    },
    /// Anything else; ignored.
    Other(serde_json::Value),
}

/// A URL given either bare or wrapped as `{"url": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UrlField {
    /// `"https://..."`
    Plain(String),
    /// `{"url": "https://..."}`
    Object {
        /// The wrapped URL.
        url: String,
    },
}

impl UrlField {
    /// Returns the URL string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(url) | Self::Object { url } => url,
        }
    }
}

impl ChatMessage {
    /// Text content of the message, with text parts joined by newlines.
    pub fn text(&self) -> Option<String> {
        let text = match self.content.as_ref()? {
            MessageContent::Text(text) => text.trim().to_string(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Typed {
                        text: Some(text), ..
                    } => Some(text.trim()),
                    _ => None,
                })
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Finds the first image in a chat message.
///
/// `message.images` is searched first; the structured `message.content` list
/// only when that yields nothing.
pub fn extract_from_message(message: &ChatMessage) -> Option<ImagePayload> {
    let from_images = message.images.iter().flatten().find_map(|entry| match entry {
        ImageEntry::Plain(value) => non_empty(value).map(ImagePayload::ChatInline),
        ImageEntry::Object { image_url, url } => image_url
            .as_ref()
            .map(UrlField::as_str)
            .or(url.as_deref())
            .and_then(non_empty)
            .map(ImagePayload::ChatUrl),
        ImageEntry::Other(_) => None,
    });
    if from_images.is_some() {
        return from_images;
    }

    let Some(MessageContent::Parts(parts)) = &message.content else {
        return None;
    };
    parts.iter().find_map(|part| match part {
        ContentPart::Typed {
            kind,
            image_url: Some(image_url),
            ..
        } if kind == "image_url" || kind == "image" => {
            non_empty(image_url.as_str()).map(ImagePayload::ContentList)
        }
        _ => None,
    })
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Returns true for `data:` URIs.
pub fn is_data_uri(value: &str) -> bool {
    value
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Returns true for URLs that must be downloaded.
pub fn is_remote_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

/// Decodes a `data:<mime>;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    if !is_data_uri(uri) {
        return Err(ImageGenError::Decode("not a data URI".into()));
    }
    let (header, data) = uri[5..]
        .split_once(',')
        .ok_or_else(|| ImageGenError::Decode("data URI has no payload".into()))?;
    if !header
        .split(';')
        .any(|param| param.trim().eq_ignore_ascii_case("base64"))
    {
        return Err(ImageGenError::Decode(
            "data URI is not base64-encoded".into(),
        ));
    }
    decode_base64(data)
}

/// Decodes standard base64, ignoring embedded whitespace and missing padding.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(ImageGenError::Decode("empty base64 payload".into()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .or_else(|_| {
            base64::engine::general_purpose::STANDARD_NO_PAD
                .decode(compact.trim_end_matches('=').as_bytes())
        })
        .map_err(|e| ImageGenError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(json: serde_json::Value) -> ChatMessage {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_decode_data_uri() {
        assert_eq!(
            decode_data_uri("data:image/png;base64,AQID").unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(
            decode_data_uri("DATA:image/png;BASE64,AQID").unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_decode_data_uri_rejects_bad_input() {
        assert!(decode_data_uri("https://example.com/a.png").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_decode_base64_tolerates_whitespace_and_padding() {
        assert_eq!(decode_base64("AQ\nID").unwrap(), vec![1, 2, 3]);
        assert_eq!(decode_base64("AQI").unwrap(), vec![1, 2]);
        assert_eq!(decode_base64("AQI=").unwrap(), vec![1, 2]);
        assert!(decode_base64("   ").is_err());
    }

    #[test]
    fn test_extract_plain_image_string() {
        let msg = message(serde_json::json!({
            "role": "assistant",
            "content": "Here you go",
            "images": ["data:image/png;base64,AQID"]
        }));
        assert_eq!(
            extract_from_message(&msg),
            Some(ImagePayload::ChatInline("data:image/png;base64,AQID".into()))
        );
        assert_eq!(msg.text().as_deref(), Some("Here you go"));
    }

    #[test]
    fn test_extract_image_object() {
        let msg = message(serde_json::json!({
            "images": [{"type": "image_url", "image_url": {"url": "https://cdn.example.com/x.png"}}]
        }));
        assert_eq!(
            extract_from_message(&msg),
            Some(ImagePayload::ChatUrl("https://cdn.example.com/x.png".into()))
        );

        let msg = message(serde_json::json!({"images": [{"url": "data:image/png;base64,AQID"}]}));
        assert_eq!(
            extract_from_message(&msg),
            Some(ImagePayload::ChatUrl("data:image/png;base64,AQID".into()))
        );
    }

    #[test]
    fn test_images_list_wins_over_content() {
        let msg = message(serde_json::json!({
            "content": [{"type": "image_url", "image_url": {"url": "https://content.example.com/b.png"}}],
            "images": ["AQID"]
        }));
        assert_eq!(
            extract_from_message(&msg),
            Some(ImagePayload::ChatInline("AQID".into()))
        );
    }

    #[test]
    fn test_empty_images_falls_back_to_content_list() {
        let msg = message(serde_json::json!({
            "images": [],
            "content": [
                {"type": "text", "text": "A cat."},
                {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AQID"}},
                {"type": "image_url", "image_url": {"url": "https://second.example.com"}}
            ]
        }));
        assert_eq!(
            extract_from_message(&msg),
            Some(ImagePayload::ContentList("data:image/jpeg;base64,AQID".into()))
        );
        assert_eq!(msg.text().as_deref(), Some("A cat."));
    }

    #[test]
    fn test_unusable_entries_are_skipped() {
        let msg = message(serde_json::json!({
            "images": [42, {"type": "image_url"}, "", "AQID"]
        }));
        assert_eq!(
            extract_from_message(&msg),
            Some(ImagePayload::ChatInline("AQID".into()))
        );
    }

    #[test]
    fn test_no_image_anywhere() {
        let msg = message(serde_json::json!({"content": "I can only describe images."}));
        assert_eq!(extract_from_message(&msg), None);
        assert_eq!(msg.text().as_deref(), Some("I can only describe images."));

        let msg = message(serde_json::json!({"content": null}));
        assert_eq!(extract_from_message(&msg), None);
        assert_eq!(msg.text(), None);
    }

    #[test]
    fn test_payload_kind_labels() {
        assert_eq!(ImagePayload::DirectBinary(String::new()).kind(), "direct-binary");
        assert_eq!(ImagePayload::ContentList(String::new()).kind(), "chat-content-list");
    }

    #[test]
    fn test_url_classification() {
        assert!(is_data_uri("data:image/png;base64,AQID"));
        assert!(!is_data_uri("dat"));
        assert!(is_remote_url("https://example.com/a.png"));
        assert!(!is_remote_url("AQID"));
    }
}
