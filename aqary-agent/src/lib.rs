//! Aqary Agent - resilient analysis client
//!
//! Issues structured analysis requests to an external generation service and
//! always hands back a complete report:
//! - Trait-based backends (Gemini over HTTPS, scripted mock)
//! - Bounded, linearly escalating retries for transient failures
//! - Defensive normalization with per-field defaults
//! - Citation extraction for grounded capabilities
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            AnalysisClient               │
//! │  (retry, backoff, cancellation)         │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌──────────────────┐
//! │ Analysis    │       │ Capability       │
//! │ Backend     │       │ Descriptor       │
//! │ (Gemini/    │       │ (request builder │
//! │  Mock)      │       │  + normalizer)   │
//! └─────────────┘       └──────────────────┘
//! ```

pub mod backend;
pub mod capability;
pub mod normalize;
pub mod request;
pub mod response;
pub mod retry;
pub mod service;
pub mod sources;

// Re-export main types for convenience
pub use backend::traits::{
    AnalysisBackend, BackendError, GenerationRequest, GenerationResponse, ModelTier,
};
pub use backend::{GeminiBackend, MockBackend};
pub use capability::{
    Capability, CapabilityDescriptor, DocumentAudit, DocumentQuery, PriceLabel, ProjectStatus,
    ReliabilityQuery, ReliabilityReport, ScenarioQuery, SimulationReport, UnitAudit, UnitQuery,
    ValuationQuery, ValuationReport,
};
pub use response::{Report, RiskLevel};
pub use retry::{RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper};
pub use service::{AnalysisClient, ClientConfig, QueryError};
pub use sources::Source;
