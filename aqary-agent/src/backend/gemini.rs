//! Gemini `generateContent` backend.
//!
//! Requests JSON output, optionally enables the Google Search tool, and sends
//! attachments as inline base64 parts ahead of the prompt.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, Client};
use serde::Serialize;
use tracing::{debug, warn};

use super::traits::*;

/// Public Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for [`ModelTier::Fast`].
pub const DEFAULT_FAST_MODEL: &str = "gemini-3-flash-preview";

/// Model used for [`ModelTier::Deep`].
pub const DEFAULT_DEEP_MODEL: &str = "gemini-3-pro-preview";

/// Gemini backend.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    fast_model: String,
    deep_model: String,
}

impl GeminiBackend {
    /// Create a backend against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, BackendError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a backend against a custom endpoint.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, BackendError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            deep_model: DEFAULT_DEEP_MODEL.to_string(),
        })
    }

    /// Override the model names per tier.
    pub fn with_models(mut self, fast: impl Into<String>, deep: impl Into<String>) -> Self {
        self.fast_model = fast.into();
        self.deep_model = deep.into();
        self
    }

    /// Model name serving a tier.
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Deep => &self.deep_model,
        }
    }

    fn generate_url(&self, tier: ModelTier) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_for(tier))
    }
}

/// `generateContent` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlinePart,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlinePart {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

fn build_body(request: &GenerationRequest) -> GenerateBody {
    let mut parts: Vec<Part> = request
        .attachments
        .iter()
        .map(|a| Part::Inline {
            inline_data: InlinePart {
                mime_type: a.mime_type.clone(),
                data: STANDARD.encode(&a.data),
            },
        })
        .collect();
    parts.push(Part::Text {
        text: request.prompt.clone(),
    });

    let tools = if request.grounded {
        vec![serde_json::json!({ "google_search": {} })]
    } else {
        Vec::new()
    };

    GenerateBody {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        tools,
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
        },
    }
}

/// Concatenated text of the first candidate.
fn candidate_text(raw: &serde_json::Value) -> Option<String> {
    let parts = raw
        .pointer("/candidates/0/content/parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl AnalysisBackend for GeminiBackend {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, BackendError> {
        let url = self.generate_url(request.tier);
        debug!(model = self.model_for(request.tier), grounded = request.grounded, "Calling Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status, body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::NetworkError(e.without_url().to_string()))?;

        // A malformed envelope still counts as an answer; normalization fills in defaults.
        let raw: serde_json::Value = match serde_json::from_str(&body) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, body_len = body.len(), "Gemini envelope is not JSON");
                return Ok(GenerationResponse {
                    text: None,
                    raw: serde_json::Value::Null,
                });
            }
        };

        Ok(GenerationResponse {
            text: candidate_text(&raw),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_body_shape() {
        let request = GenerationRequest::new(ModelTier::Deep, "audit this")
            .with_attachment("image/png", vec![1, 2, 3])
            .with_grounding();
        let body = serde_json::to_value(build_body(&request)).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "AQID");
        assert_eq!(parts[1]["text"], "audit this");
        assert_eq!(body["tools"][0], serde_json::json!({ "google_search": {} }));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_ungrounded_body_has_no_tools() {
        let body = serde_json::to_value(build_body(&GenerationRequest::new(ModelTier::Fast, "x")))
            .unwrap();
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_model_routing() {
        let backend = GeminiBackend::new("k").unwrap().with_models("fast-m", "deep-m");
        assert_eq!(backend.model_for(ModelTier::Fast), "fast-m");
        assert!(backend
            .generate_url(ModelTier::Deep)
            .ends_with("/models/deep-m:generateContent"));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/flash:generateContent"))
            .and(header_eq("x-goog-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{\"score\":" }, { "text": " 80}" }] },
                    "groundingMetadata": { "groundingChunks": [] }
                }]
            })))
            .mount(&server)
            .await;

        let backend = GeminiBackend::with_base_url(server.uri(), "secret")
            .unwrap()
            .with_models("flash", "pro");
        let response = backend
            .generate(&GenerationRequest::new(ModelTier::Fast, "hi"))
            .await
            .unwrap();

        assert_eq!(response.text.as_deref(), Some("{\"score\": 80}"));
        assert!(response.raw.pointer("/candidates/0/groundingMetadata").is_some());
    }

    #[tokio::test]
    async fn test_generate_classifies_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/flash:generateContent"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/pro:generateContent"))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let backend = GeminiBackend::with_base_url(server.uri(), "k")
            .unwrap()
            .with_models("flash", "pro");

        let limited = backend
            .generate(&GenerationRequest::new(ModelTier::Fast, "x"))
            .await
            .unwrap_err();
        assert!(matches!(limited, BackendError::RateLimited(_)));
        assert!(limited.is_retryable());

        let rejected = backend
            .generate(&GenerationRequest::new(ModelTier::Deep, "x"))
            .await
            .unwrap_err();
        assert!(!rejected.is_retryable());
    }

    #[tokio::test]
    async fn test_connection_failure_ignores_url_digits() {
        // Nothing listens on port 1; the path carries a retryable-looking number.
        let backend = GeminiBackend::with_base_url("http://127.0.0.1:1/v500", "k").unwrap();

        let err = backend
            .generate(&GenerationRequest::new(ModelTier::Fast, "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::NetworkError(_)));
        assert!(!err.to_string().contains("127.0.0.1"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_non_json_envelope_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let backend = GeminiBackend::with_base_url(server.uri(), "k")
            .unwrap()
            .with_models("flash", "pro");
        let response = backend
            .generate(&GenerationRequest::new(ModelTier::Fast, "x"))
            .await
            .unwrap();

        assert!(response.text.is_none());
        assert!(response.raw.is_null());
    }
}
