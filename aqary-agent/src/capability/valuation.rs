//! Fair price estimation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{Capability, CapabilityDescriptor};
use crate::backend::{GenerationRequest, GenerationResponse};
use crate::normalize::{fold_label, parse_payload, FieldReader};
use crate::request::trim_input;
use crate::response::Report;
use crate::sources::{extract_sources, Source};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// How the asking price compares with the market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum PriceLabel {
    Overpriced,
    #[default]
    Fair,
    Undervalued,
}

impl FromStr for PriceLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_label(s).as_str() {
            "overpriced" => Ok(Self::Overpriced),
            "fair" => Ok(Self::Fair),
            "undervalued" => Ok(Self::Undervalued),
            _ => Err(format!("Unknown price label: {s}")),
        }
    }
}

/// Unit to price.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationQuery {
    pub location: String,
    /// Unit category, e.g. apartment or villa
    pub unit_type: String,
    pub area_sqm: f64,
    /// Delivery horizon, e.g. "Ready" or "2027"
    pub delivery: String,
}

impl ValuationQuery {
    pub fn new(
        location: impl AsRef<str>,
        unit_type: impl AsRef<str>,
        area_sqm: f64,
        delivery: impl AsRef<str>,
    ) -> Self {
        Self {
            location: trim_input(location.as_ref()),
            unit_type: trim_input(unit_type.as_ref()),
            area_sqm,
            delivery: trim_input(delivery.as_ref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ValuationReport {
    pub min_price: f64,
    pub avg_price: f64,
    pub max_price: f64,
    pub label: PriceLabel,
    pub explanation: String,
    pub rental_yield: String,
    #[serde(rename = "estimatedROI")]
    pub estimated_roi: String,
    pub sources: Vec<Source>,
    pub defaulted_fields: Vec<String>,
}

impl Report for ValuationReport {
    fn defaulted_fields(&self) -> &[String] {
        &self.defaulted_fields
    }
}

impl CapabilityDescriptor for ValuationQuery {
    type Report = ValuationReport;

    fn capability(&self) -> Capability {
        Capability::Valuation
    }

    fn build_request(&self) -> GenerationRequest {
        let prompt = format!(
            "Estimate the fair market value of a {unit_type} in {location}, Egypt. \
             Area: {area} sqm. Delivery: {delivery}. \
             Base the estimate on recent closed resale deals in the same area and current EGP pricing. \
             Return JSON with: minPrice, maxPrice, avgPrice, label (Overpriced/Fair/Undervalued), \
             explanation, rentalYield, estimatedROI.",
            unit_type = self.unit_type,
            location = self.location,
            area = self.area_sqm,
            delivery = self.delivery,
        );
        GenerationRequest::new(self.capability().tier(), prompt).with_grounding()
    }

    fn normalize(&self, response: &GenerationResponse) -> ValuationReport {
        let payload = parse_payload(response.text.as_deref());
        let mut fields = FieldReader::new(&payload);

        ValuationReport {
            min_price: fields.number("minPrice"),
            avg_price: fields.number("avgPrice"),
            max_price: fields.number("maxPrice"),
            label: fields.label("label"),
            explanation: fields.text("explanation", "Pricing audit unavailable."),
            rental_yield: fields.text("rentalYield", "N/A"),
            estimated_roi: fields.text("estimatedROI", "N/A"),
            sources: extract_sources(&response.raw),
            defaulted_fields: fields.finish(),
        }
    }
}
