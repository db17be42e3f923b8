//! Core traits for analysis backends.
//!
//! This module defines the `AnalysisBackend` trait - the seam between the
//! retrying client and whatever service actually answers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error types for backend calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// Rate limited by the service (HTTP 429)
    #[error("Rate limited (429): {0}")]
    RateLimited(String),

    /// Service-side failure (HTTP 5xx)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Usage quota exhausted
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Request rejected by the service (other HTTP status)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Transport-level failure
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Substrings that mark an otherwise untyped failure as transient.
const RETRYABLE_SIGNALS: [&str; 3] = ["429", "500", "quota"];

impl BackendError {
    /// Whether another attempt may succeed.
    ///
    /// Typed rate-limit, server and quota failures always qualify. Other
    /// failures qualify only if their message carries a retryable signal.
    /// Backends keep request URLs out of these messages.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Server { .. } | Self::QuotaExhausted(_) => true,
            Self::RequestFailed(message) | Self::NetworkError(message) => {
                let message = message.to_ascii_lowercase();
                RETRYABLE_SIGNALS.iter().any(|signal| message.contains(signal))
            }
        }
    }

    /// Classify an HTTP failure status and body.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let lowered = body.to_ascii_lowercase();
        if lowered.contains("quota") || lowered.contains("resource_exhausted") {
            return Self::QuotaExhausted(body);
        }
        match status {
            429 => Self::RateLimited(body),
            500..=599 => Self::Server {
                status,
                message: body,
            },
            _ => Self::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }
}

/// Model tier a capability asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Fast model, used for lookups
    Fast,
    /// Stronger reasoning model
    Deep,
}

/// Inline binary attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    /// Media type, e.g. `image/jpeg`
    pub mime_type: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

/// One structured request to the analysis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Which model tier should answer
    pub tier: ModelTier,
    /// Instruction text
    pub prompt: String,
    /// Attachments sent before the prompt
    pub attachments: Vec<InlineData>,
    /// Whether the service may consult web search
    pub grounded: bool,
}

impl GenerationRequest {
    /// Create a text-only request.
    pub fn new(tier: ModelTier, prompt: impl Into<String>) -> Self {
        Self {
            tier,
            prompt: prompt.into(),
            attachments: Vec::new(),
            grounded: false,
        }
    }

    /// Allow web search grounding.
    pub fn with_grounding(mut self) -> Self {
        self.grounded = true;
        self
    }

    /// Attach inline data.
    pub fn with_attachment(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.attachments.push(InlineData {
            mime_type: mime_type.into(),
            data,
        });
        self
    }
}

/// Successful service response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResponse {
    /// Generated text, expected to be a JSON document
    pub text: Option<String>,
    /// Full response envelope, for citation metadata
    pub raw: serde_json::Value,
}

impl GenerationResponse {
    /// Response with text and no envelope metadata.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            raw: serde_json::Value::Null,
        }
    }
}

/// Core trait for analysis backends.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Backend identifier.
    fn id(&self) -> &str;

    /// Perform a single request. No retries happen at this level.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_failures_are_retryable() {
        assert!(BackendError::RateLimited("slow down".into()).is_retryable());
        assert!(BackendError::Server {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(BackendError::QuotaExhausted("daily".into()).is_retryable());
    }

    #[test]
    fn test_untyped_failures_match_signals() {
        assert!(BackendError::RequestFailed("upstream said 429".into()).is_retryable());
        assert!(BackendError::NetworkError("got 500 from proxy".into()).is_retryable());
        assert!(BackendError::RequestFailed("Quota exceeded".into()).is_retryable());
        assert!(!BackendError::RequestFailed("HTTP 400: bad key".into()).is_retryable());
        assert!(!BackendError::NetworkError("connection refused".into()).is_retryable());
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            BackendError::from_status(429, "too many"),
            BackendError::RateLimited(_)
        ));
        assert!(matches!(
            BackendError::from_status(502, "bad gateway"),
            BackendError::Server { status: 502, .. }
        ));
        assert!(matches!(
            BackendError::from_status(429, "RESOURCE_EXHAUSTED"),
            BackendError::QuotaExhausted(_)
        ));
        let fatal = BackendError::from_status(403, "permission denied");
        assert!(matches!(fatal, BackendError::RequestFailed(_)));
        assert!(!fatal.is_retryable());
    }
}
