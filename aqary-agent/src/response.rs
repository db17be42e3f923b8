//! Shared report types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::normalize::fold_label;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Three-step risk scale, used for scenario risk and clause severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_label(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" | "moderate" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown risk level: {s}")),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(s)
    }
}

/// Common surface of every normalized report.
pub trait Report {
    /// Fields that were absent or mistyped in the response.
    fn defaulted_fields(&self) -> &[String];

    /// True when any field fell back to a default.
    fn is_low_confidence(&self) -> bool {
        !self.defaulted_fields().is_empty()
    }
}
