//! Analysis capability definitions.

use serde::{Deserialize, Serialize};

use crate::backend::ModelTier;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Analyses the service can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Fair market price for a unit
    Valuation,
    /// Track record of a developer
    EntityReliability,
    /// Outcome ranges for an investment scenario
    ScenarioSimulation,
    /// Risk review of a contract image
    DocumentAudit,
    /// Honesty check of a unit listing
    UnitAudit,
}

impl Capability {
    /// Model tier the capability runs on.
    pub fn tier(&self) -> ModelTier {
        match self {
            Self::Valuation | Self::EntityReliability | Self::UnitAudit => ModelTier::Fast,
            Self::ScenarioSimulation | Self::DocumentAudit => ModelTier::Deep,
        }
    }

    /// Whether the service may consult web search, and so return citations.
    pub fn is_grounded(&self) -> bool {
        matches!(self, Self::Valuation | Self::EntityReliability)
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Valuation => "Estimate fair market value from recent closed deals",
            Self::EntityReliability => "Audit a developer's delivery record and legal standing",
            Self::ScenarioSimulation => "Simulate risk and return for an investment scenario",
            Self::DocumentAudit => "Flag risky clauses in a property contract image",
            Self::UnitAudit => "Check a unit listing for specs, value and marketing traps",
        }
    }

    /// All capabilities as a list.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Valuation,
            Self::EntityReliability,
            Self::ScenarioSimulation,
            Self::DocumentAudit,
            Self::UnitAudit,
        ]
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Valuation => "valuation",
            Self::EntityReliability => "entity-reliability",
            Self::ScenarioSimulation => "scenario-simulation",
            Self::DocumentAudit => "document-audit",
            Self::UnitAudit => "unit-audit",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_serialization() {
        let cap = Capability::EntityReliability;
        let json = serde_json::to_string(&cap).unwrap();
        assert_eq!(json, "\"entity-reliability\"");
        assert_eq!(cap.to_string(), "entity-reliability");

        let parsed: Capability = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cap);
    }

    #[test]
    fn test_simulation_is_not_grounded() {
        assert!(!Capability::ScenarioSimulation.is_grounded());
        assert!(Capability::Valuation.is_grounded());
        assert_eq!(Capability::DocumentAudit.tier(), ModelTier::Deep);
        assert_eq!(Capability::all().len(), 5);
    }
}
