//! Analysis backend abstraction layer.
//!
//! - Gemini `generateContent` over HTTPS
//! - Mock backend for testing

pub mod gemini;
pub mod mock;
pub mod traits;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use traits::{
    AnalysisBackend, BackendError, GenerationRequest, GenerationResponse, InlineData, ModelTier,
};
