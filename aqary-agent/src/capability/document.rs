//! Contract document audit from an image.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::{Capability, CapabilityDescriptor};
use crate::backend::{GenerationRequest, GenerationResponse};
use crate::normalize::{parse_payload, FieldReader};
use crate::response::{Report, RiskLevel};

#[cfg(feature = "typescript")]
use ts_rs::TS;

const AUDIT_PROMPT: &str = "Audit this Egyptian property contract image. \
    Identify predatory clauses, delivery delay risks, unclear maintenance fees and legal loopholes. \
    Return JSON with: summary, riskPoints[{title, description, severity (Low/Medium/High), suggestedAction}], \
    clarityNotes, disclaimer.";

/// Contract image to audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    pub mime_type: String,
    pub image: Vec<u8>,
}

impl DocumentQuery {
    pub fn new(mime_type: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            image,
        }
    }

    /// Build from base64 image data, as uploaded by a browser.
    pub fn from_base64(mime_type: impl Into<String>, data: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self::new(mime_type, STANDARD.decode(data.trim())?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RiskPoint {
    pub title: String,
    pub description: String,
    pub severity: RiskLevel,
    pub suggested_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct DocumentAudit {
    pub summary: String,
    pub risk_points: Vec<RiskPoint>,
    pub clarity_notes: String,
    pub disclaimer: String,
    pub defaulted_fields: Vec<String>,
}

impl Report for DocumentAudit {
    fn defaulted_fields(&self) -> &[String] {
        &self.defaulted_fields
    }
}

impl CapabilityDescriptor for DocumentQuery {
    type Report = DocumentAudit;

    fn capability(&self) -> Capability {
        Capability::DocumentAudit
    }

    fn build_request(&self) -> GenerationRequest {
        GenerationRequest::new(self.capability().tier(), AUDIT_PROMPT)
            .with_attachment(self.mime_type.clone(), self.image.clone())
    }

    fn normalize(&self, response: &GenerationResponse) -> DocumentAudit {
        let payload = parse_payload(response.text.as_deref());
        let mut fields = FieldReader::new(&payload);

        DocumentAudit {
            summary: fields.text("summary", "Legal audit unavailable."),
            risk_points: fields.objects("riskPoints", |point| RiskPoint {
                title: point.text("title", "Untitled clause"),
                description: point.text("description", ""),
                severity: point.label("severity"),
                suggested_action: point.text("suggestedAction", ""),
            }),
            clarity_notes: fields.text("clarityNotes", "N/A"),
            disclaimer: fields.text("disclaimer", "This is not formal legal advice."),
            defaulted_fields: fields.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_image() {
        let query = DocumentQuery::from_base64("image/jpeg", "/9j/4A==").unwrap();
        assert_eq!(query.image, vec![0xFF, 0xD8, 0xFF, 0xE0]);

        let request = query.build_request();
        assert_eq!(request.attachments.len(), 1);
        assert_eq!(request.attachments[0].mime_type, "image/jpeg");
        assert!(!request.grounded);
    }

    #[test]
    fn test_normalize_empty_payload() {
        let audit = DocumentQuery::new("image/png", vec![]).normalize(&GenerationResponse::from_text("{}"));
        assert_eq!(audit.summary, "Legal audit unavailable.");
        assert!(audit.risk_points.is_empty());
        assert_eq!(audit.clarity_notes, "N/A");
        assert_eq!(audit.disclaimer, "This is not formal legal advice.");
        assert_eq!(audit.defaulted_fields.len(), 4);
    }

    #[test]
    fn test_risk_points() {
        let text = r#"{
            "summary": "Two issues",
            "riskPoints": [
                {"title": "Penalty", "description": "One-sided", "severity": "High", "suggestedAction": "Negotiate"},
                {"title": "Fees", "severity": "critical"}
            ],
            "clarityNotes": "Clear",
            "disclaimer": "Not advice"
        }"#;
        let audit = DocumentQuery::new("image/png", vec![]).normalize(&GenerationResponse::from_text(text));
        assert_eq!(audit.risk_points[0].severity, RiskLevel::High);
        assert_eq!(audit.risk_points[1].severity, RiskLevel::Medium);
        assert_eq!(
            audit.defaulted_fields,
            vec![
                "riskPoints[1].description",
                "riskPoints[1].severity",
                "riskPoints[1].suggestedAction"
            ]
        );
    }
}
