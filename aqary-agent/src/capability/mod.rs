//! Capability types and per-capability descriptors.

pub mod document;
pub mod reliability;
pub mod simulation;
pub mod types;
pub mod unit;
pub mod valuation;

pub use document::{DocumentAudit, DocumentQuery, RiskPoint};
pub use reliability::{ProjectRecord, ProjectStatus, ReliabilityBreakdown, ReliabilityQuery, ReliabilityReport};
pub use simulation::{ScenarioQuery, SimulationReport};
pub use types::Capability;
pub use unit::{UnitAudit, UnitBreakdown, UnitQuery};
pub use valuation::{PriceLabel, ValuationQuery, ValuationReport};

use crate::backend::{GenerationRequest, GenerationResponse};

/// Plugs one capability into the shared client.
///
/// The client owns transport, retries and cancellation; a descriptor only
/// builds the request and turns a successful response into a complete report.
pub trait CapabilityDescriptor: Send + Sync {
    /// Normalized, fully defaulted result.
    type Report: Send;

    fn capability(&self) -> Capability;

    /// Build the request sent on every attempt.
    fn build_request(&self) -> GenerationRequest;

    /// Read a successful response. Must not fail.
    fn normalize(&self, response: &GenerationResponse) -> Self::Report;
}
