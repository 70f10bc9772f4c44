//! Chat-completion endpoint provider.

use super::{ApiErrorDetail, Transport};
use crate::error::{truncate_preview, ImageGenError, Result, PREVIEW_CHARS};
use crate::image::payload::{extract_from_message, ChatMessage, Generation};
use crate::image::provider::{ImageProvider, Route};
use crate::image::types::GenerationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider for `/chat/completions`, used by image-capable chat models that
/// attach the generated image to the assistant message.
#[derive(Debug, Clone)]
pub struct ChatCompletionProvider {
    transport: Transport,
}

impl ChatCompletionProvider {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ImageProvider for ChatCompletionProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let body = ChatRequest::from_generation_request(request);
        tracing::debug!(model = %body.model, "requesting chat completion");

        let response = self
            .transport
            .post_json(Route::ChatCompletion, &body)
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(self.transport.parse_error(status.as_u16(), &text));
        }

        let chat: ChatResponse = serde_json::from_str(&text)?;
        // some gateways report upstream failures in-band with a 200
        if let Some(error) = chat.error.filter(|_| chat.choices.is_empty()) {
            let status = error
                .code
                .as_ref()
                .and_then(serde_json::Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(status.as_u16());
            return Err(ImageGenError::Api {
                status,
                message: self
                    .transport
                    .redact(error.message.as_deref().unwrap_or("upstream provider error")),
            });
        }

        let message = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .ok_or_else(|| {
                ImageGenError::UnexpectedResponse("chat response has no message object".into())
            })?;

        let caption = message.text();
        match extract_from_message(&message) {
            Some(payload) => {
                tracing::debug!(kind = payload.kind(), "located image in chat message");
                Ok(Generation { payload, caption })
            }
            None => Err(ImageGenError::NoImage {
                preview: caption.map(|text| truncate_preview(&text, PREVIEW_CHARS)),
            }),
        }
    }

    fn route(&self) -> Route {
        Route::ChatCompletion
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: String,
}

impl ChatRequest {
    fn from_generation_request(req: &GenerationRequest) -> Self {
        Self {
            model: req.model.clone(),
            messages: vec![ChatRequestMessage {
                role: "user",
                content: req.prompt.clone(),
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
}
