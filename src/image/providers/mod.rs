//! Image generation providers, one per calling convention.

mod chat;
mod images;

pub use chat::ChatCompletionProvider;
pub use images::ImageGenerationProvider;

use crate::error::{sanitize_error_message, ImageGenError, Result};
use crate::image::provider::Route;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// HTTP plumbing shared by the providers.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl Transport {
    pub(crate) fn new(client: reqwest::Client, base_url: String, api_key: SecretString) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    pub(crate) fn endpoint(&self, route: Route) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), route.path())
    }

    /// POSTs an authenticated JSON body to `route`.
    pub(crate) async fn post_json<B>(&self, route: Route, body: &B) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(self.endpoint(route))
            .bearer_auth(self.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        Ok(response)
    }

    /// Downloads an externally hosted image. No credentials are sent.
    pub(crate) async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url = %url, "downloading image");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageGenError::Api {
                status: status.as_u16(),
                message: "failed to download image from URL".into(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Replaces every occurrence of the API key in `text`, then applies
    /// [`sanitize_error_message`].
    pub(crate) fn redact(&self, text: &str) -> String {
        let key = self.api_key.expose_secret();
        if key.is_empty() {
            return sanitize_error_message(text);
        }
        sanitize_error_message(&text.replace(key, "***"))
    }

    /// Maps a non-success response to an error, keeping credentials out of it.
    pub(crate) fn parse_error(&self, status: u16, text: &str) -> ImageGenError {
        let message = ApiErrorEnvelope::parse(text)
            .and_then(|detail| detail.message)
            .unwrap_or_else(|| text.to_string());
        let message = self.redact(&message);
        match status {
            401 | 403 => ImageGenError::Auth(message),
            _ => ImageGenError::Api { status, message },
        }
    }
}

/// OpenAI-style error body: `{"error": {"message": ..., "param": ..., "code": ...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub(crate) error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) param: Option<String>,
    #[serde(default)]
    pub(crate) code: Option<serde_json::Value>,
}

impl ApiErrorEnvelope {
    pub(crate) fn parse(text: &str) -> Option<ApiErrorDetail> {
        serde_json::from_str::<Self>(text).ok().map(|e| e.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(api_key: &str) -> Transport {
        Transport::new(
            reqwest::Client::new(),
            "https://api.example.com/v1/".into(),
            SecretString::from(api_key.to_owned()),
        )
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let transport = transport("k");
        assert_eq!(
            transport.endpoint(Route::ImageGeneration),
            "https://api.example.com/v1/images/generations"
        );
        assert_eq!(
            transport.endpoint(Route::ChatCompletion),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_error_uses_structured_message() {
        let body = r#"{"error": {"message": "Model not found", "code": 404}}"#;
        let err = transport("k-test").parse_error(404, body);
        assert_eq!(err.to_string(), "API error: 404 - Model not found");
    }

    #[test]
    fn test_parse_error_auth() {
        let body = r#"{"error": {"message": "Incorrect API key provided: sk-abc123"}}"#;
        let err = transport("sk-abc123").parse_error(401, body);
        assert!(matches!(err, ImageGenError::Auth(_)));
        assert!(!err.to_string().contains("abc123"));
    }

    #[test]
    fn test_parse_error_scrubs_key_of_any_shape() {
        let body = r#"{"error": {"message": "key abc123 is not valid (got abc123)"}}"#;
        let err = transport("abc123").parse_error(401, body);
        assert_eq!(
            err.to_string(),
            "authentication failed: key *** is not valid (got ***)"
        );

        let err = transport("abc123").parse_error(500, "raw body echoing abc123");
        assert_eq!(err.to_string(), "API error: 500 - raw body echoing ***");
    }

    #[test]
    fn test_parse_error_plain_text_body() {
        let err = transport("k-test").parse_error(502, "Bad gateway");
        assert_eq!(err.to_string(), "API error: 502 - Bad gateway");
    }
}
