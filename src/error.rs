//! Error types for image generation.

/// Upper bound, in characters, for response text quoted back to the operator.
pub const PREVIEW_CHARS: usize = 500;

/// Errors that can occur while generating an image.
#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    /// Credential file missing, unreadable, or without a usable key.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid request parameters (e.g. an empty prompt).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API key rejected by the remote service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status, or the numeric code of an in-band error.
        status: u16,
        /// Remote error message with credentials removed.
        message: String,
    },

    /// Network or HTTP transport error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body lacked a field the endpoint is expected to return.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Chat response carried no image in any recognized location.
    #[error(
        "no image found in response{}",
        .preview.as_deref().map(|p| format!("; model said: {p}")).unwrap_or_default()
    )]
    NoImage {
        /// Bounded preview of any text the model returned instead.
        preview: Option<String>,
    },

    /// Failed to decode base64 or data URI payload.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for image generation operations.
pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Strips anything resembling a credential from a remote error body and
/// bounds its length.
pub fn sanitize_error_message(text: &str) -> String {
    let redacted = redact_token_after(text, "Bearer ");
    let redacted = redact_token_after(&redacted, "sk-");
    truncate_preview(&redacted, PREVIEW_CHARS)
}

/// Trims `text` and cuts it to at most `max_chars` characters, appending
/// `...` when anything was dropped.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

fn redact_token_after(text: &str, marker: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(marker) {
        let (head, tail) = rest.split_at(pos + marker.len());
        out.push_str(head);
        // only at a word boundary ("task-force" is not a key)
        let at_boundary = rest[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        if !at_boundary {
            rest = tail;
            continue;
        }
        let token_len = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
            .unwrap_or(tail.len());
        if token_len > 0 {
            out.push_str("***");
        }
        rest = &tail[token_len..];
    }
    out.push_str(rest);
    out
}
