//! Mock analysis backend for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::traits::*;

/// Mock backend for testing.
///
/// Plays back queued outcomes in order, then repeats the fallback response.
pub struct MockBackend {
    model_id: String,
    script: Mutex<VecDeque<Result<GenerationResponse, BackendError>>>,
    fallback: GenerationResponse,
    requests: Mutex<Vec<GenerationRequest>>,
    call_count: AtomicU32,
}

impl MockBackend {
    /// Create a new mock backend answering with an empty JSON object.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: GenerationResponse::from_text("{}"),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the response returned once the script is exhausted.
    pub fn with_response(mut self, response: GenerationResponse) -> Self {
        self.fallback = response;
        self
    }

    /// Set a text-only fallback response.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(GenerationResponse::from_text(text))
    }

    /// Queue a failure.
    pub fn then_fail(self, error: BackendError) -> Self {
        self.script_mut().push_back(Err(error));
        self
    }

    /// Queue the same failure `times` times.
    pub fn then_fail_times(self, error: BackendError, times: usize) -> Self {
        {
            let mut script = self.script_mut();
            for _ in 0..times {
                script.push_back(Err(error.clone()));
            }
        }
        self
    }

    /// Queue a success.
    pub fn then_respond(self, response: GenerationResponse) -> Self {
        self.script_mut().push_back(Ok(response));
        self
    }

    /// Get the number of times generate was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn script_mut(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<GenerationResponse, BackendError>>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl AnalysisBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, BackendError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let next = self.script_mut().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_script() {
        let backend = MockBackend::new("test-model")
            .then_fail(BackendError::RateLimited("busy".into()))
            .then_respond(GenerationResponse::from_text("{\"a\":1}"))
            .with_text("{}");

        let request = GenerationRequest::new(ModelTier::Fast, "Hi");
        assert!(backend.generate(&request).await.is_err());
        assert_eq!(
            backend.generate(&request).await.unwrap().text.as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(
            backend.generate(&request).await.unwrap().text.as_deref(),
            Some("{}")
        );
        assert_eq!(backend.call_count(), 3);
        assert_eq!(backend.requests()[0].prompt, "Hi");
    }
}
