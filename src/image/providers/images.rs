//! Image-generation endpoint provider (DALL-E family).

use super::{ApiErrorEnvelope, Transport};
use crate::error::{ImageGenError, Result};
use crate::image::payload::{Generation, ImagePayload};
use crate::image::provider::{ImageProvider, Route};
use crate::image::types::GenerationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const RESPONSE_FORMAT_PARAM: &str = "response_format";

/// Provider for `/images/generations`.
///
/// Asks for base64 first. A model that rejects the `response_format`
/// parameter gets exactly one retry asking for a URL instead.
#[derive(Debug, Clone)]
pub struct ImageGenerationProvider {
    transport: Transport,
}

impl ImageGenerationProvider {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    async fn send(&self, body: &ImagesRequest) -> Result<Attempt> {
        tracing::debug!(
            model = %body.model,
            response_format = ?body.response_format,
            "requesting image generation"
        );
        let response = self
            .transport
            .post_json(Route::ImageGeneration, body)
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Ok(Attempt::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(Attempt::Accepted(serde_json::from_str(&text)?))
    }
}

#[async_trait]
impl ImageProvider for ImageGenerationProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let body = ImagesRequest::from_generation_request(request, ResponseFormat::B64Json);

        let response = match self.send(&body).await? {
            Attempt::Accepted(response) => response,
            Attempt::Rejected { status, body } if rejects_response_format(&body) => {
                tracing::warn!(
                    status,
                    model = %request.model,
                    "model rejected response_format=b64_json, retrying with url"
                );
                let body = ImagesRequest::from_generation_request(request, ResponseFormat::Url);
                match self.send(&body).await? {
                    Attempt::Accepted(response) => response,
                    Attempt::Rejected { status, body } => {
                        return Err(self.transport.parse_error(status, &body))
                    }
                }
            }
            Attempt::Rejected { status, body } => {
                return Err(self.transport.parse_error(status, &body))
            }
        };

        let image_data = response.data.into_iter().next().ok_or_else(|| {
            ImageGenError::UnexpectedResponse("no images in image-generation response".into())
        })?;

        let payload = match (image_data.b64_json, image_data.url) {
            (Some(b64), _) => ImagePayload::DirectBinary(b64),
            (None, Some(url)) => ImagePayload::DirectUrl(url),
            (None, None) => {
                return Err(ImageGenError::UnexpectedResponse(
                    "image-generation response contained no image data".into(),
                ))
            }
        };

        Ok(Generation {
            payload,
            caption: image_data.revised_prompt,
        })
    }

    fn route(&self) -> Route {
        Route::ImageGeneration
    }
}

enum Attempt {
    Accepted(ImagesResponse),
    Rejected { status: u16, body: String },
}

/// Whether an error body blames the `response_format` parameter.
///
/// Prefers the structured `error.param`; falls back to the message text,
/// which is worded differently across providers.
fn rejects_response_format(body: &str) -> bool {
    match ApiErrorEnvelope::parse(body) {
        Some(detail) if detail.param.as_deref() == Some(RESPONSE_FORMAT_PARAM) => true,
        Some(detail) => detail
            .message
            .is_some_and(|message| message.contains(RESPONSE_FORMAT_PARAM)),
        None => body.contains(RESPONSE_FORMAT_PARAM),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ResponseFormat {
    B64Json,
    Url,
}

#[derive(Debug, Serialize)]
struct ImagesRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    response_format: ResponseFormat,
}

impl ImagesRequest {
    fn from_generation_request(req: &GenerationRequest, response_format: ResponseFormat) -> Self {
        Self {
            model: req.model.clone(),
            prompt: req.prompt.clone(),
            n: 1,
            size: req.size.clone(),
            response_format,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_construction() {
        let req = GenerationRequest::new("A sunset")
            .with_model("dall-e-3")
            .with_size("1792x1024");
        let body = ImagesRequest::from_generation_request(&req, ResponseFormat::B64Json);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "dall-e-3",
                "prompt": "A sunset",
                "n": 1,
                "size": "1792x1024",
                "response_format": "b64_json"
            })
        );
    }

    #[test]
    fn test_url_response_format_serialization() {
        let req = GenerationRequest::new("A sunset").with_model("dall-e-2");
        let body = ImagesRequest::from_generation_request(&req, ResponseFormat::Url);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"], "url");
    }

    #[test]
    fn test_response_deserialization_url() {
        let json = r#"{"created": 1, "data": [{"url": "https://example.com/img.png", "revised_prompt": "A beautiful sunset"}]}"#;
        let resp: ImagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 1);
        assert_eq!(resp.data[0].url.as_deref(), Some("https://example.com/img.png"));
        assert_eq!(resp.data[0].revised_prompt.as_deref(), Some("A beautiful sunset"));
    }

    #[test]
    fn test_response_deserialization_b64() {
        let json = r#"{"data": [{"b64_json": "AQID"}]}"#;
        let resp: ImagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].b64_json.as_deref(), Some("AQID"));
        assert!(resp.data[0].url.is_none());
    }

    #[test]
    fn test_rejects_response_format_structured_param() {
        let body = r#"{"error": {"message": "Unknown parameter.", "param": "response_format", "code": "unknown_parameter"}}"#;
        assert!(rejects_response_format(body));
    }

    #[test]
    fn test_rejects_response_format_message() {
        let body = r#"{"error": {"message": "Invalid value for 'response_format': not supported by this model."}}"#;
        assert!(rejects_response_format(body));
        assert!(rejects_response_format("response_format is not supported"));
    }

    #[test]
    fn test_other_errors_do_not_trigger_fallback() {
        let body = r#"{"error": {"message": "Your prompt was rejected by the safety system.", "param": "prompt"}}"#;
        assert!(!rejects_response_format(body));
        assert!(!rejects_response_format("Internal Server Error"));
    }
}
