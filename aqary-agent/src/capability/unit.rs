//! Unit listing audit.

use serde::{Deserialize, Serialize};

use super::{Capability, CapabilityDescriptor};
use crate::backend::{GenerationRequest, GenerationResponse};
use crate::normalize::{parse_payload, FieldReader};
use crate::request::trim_input;
use crate::response::Report;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Listing text to audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitQuery {
    pub description: String,
}

impl UnitQuery {
    pub fn new(description: impl AsRef<str>) -> Self {
        Self {
            description: trim_input(description.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UnitBreakdown {
    pub specs: f64,
    pub location: f64,
    pub value_for_money: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UnitAudit {
    pub score: f64,
    pub honesty_score: f64,
    pub breakdown: UnitBreakdown,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub red_flags: Vec<String>,
    pub summary: String,
    pub defaulted_fields: Vec<String>,
}

impl Report for UnitAudit {
    fn defaulted_fields(&self) -> &[String] {
        &self.defaulted_fields
    }
}

impl CapabilityDescriptor for UnitQuery {
    type Report = UnitAudit;

    fn capability(&self) -> Capability {
        Capability::UnitAudit
    }

    fn build_request(&self) -> GenerationRequest {
        let prompt = format!(
            "Audit this Egyptian property listing for an investor: \"{description}\". \
             Check the loading factor, real orientation and current EGP value, \
             and flag marketing traps such as vague delivery or over-promising. \
             Return JSON with: score (0-100), honestyScore (0-100), \
             breakdown{{specs, location, valueForMoney}} (0-100 each), pros[], cons[], redFlags[], summary.",
            description = self.description,
        );
        GenerationRequest::new(self.capability().tier(), prompt)
    }

    fn normalize(&self, response: &GenerationResponse) -> UnitAudit {
        let payload = parse_payload(response.text.as_deref());
        let mut fields = FieldReader::new(&payload);

        UnitAudit {
            score: fields.number("score"),
            honesty_score: fields.number("honestyScore"),
            breakdown: UnitBreakdown {
                specs: fields.number("breakdown.specs"),
                location: fields.number("breakdown.location"),
                value_for_money: fields.number("breakdown.valueForMoney"),
            },
            pros: fields.strings("pros"),
            cons: fields.strings("cons"),
            red_flags: fields.strings("redFlags"),
            summary: fields.text("summary", "Audit incomplete."),
            defaulted_fields: fields.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_empty_payload() {
        let audit = UnitQuery::new("3BR, sea view").normalize(&GenerationResponse::default());
        assert_eq!(audit.score, 0.0);
        assert_eq!(audit.honesty_score, 0.0);
        assert_eq!(audit.breakdown, UnitBreakdown::default());
        assert!(audit.pros.is_empty() && audit.cons.is_empty() && audit.red_flags.is_empty());
        assert_eq!(audit.summary, "Audit incomplete.");
        assert_eq!(audit.defaulted_fields.len(), 9);
    }

    #[test]
    fn test_partial_payload() {
        let audit = UnitQuery::new("3BR")
            .normalize(&GenerationResponse::from_text(r#"{"score": 64, "redFlags": ["No delivery date"]}"#));
        assert_eq!(audit.score, 64.0);
        assert_eq!(audit.red_flags, vec!["No delivery date"]);
        assert!(!audit.defaulted_fields.contains(&"score".to_string()));
    }
}
