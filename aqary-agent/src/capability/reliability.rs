//! Developer reliability audit.

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

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum ProjectStatus {
    Delivered,
    #[default]
    #[serde(rename = "Under Construction")]
    UnderConstruction,
    Launched,
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_label(s).as_str() {
            "delivered" => Ok(Self::Delivered),
            "underconstruction" => Ok(Self::UnderConstruction),
            "launched" => Ok(Self::Launched),
            _ => Err(format!("Unknown project status: {s}")),
        }
    }
}

/// Developer to audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReliabilityQuery {
    pub entity: String,
}

impl ReliabilityQuery {
    pub fn new(entity: impl AsRef<str>) -> Self {
        Self {
            entity: trim_input(entity.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityBreakdown {
    pub punctuality: f64,
    pub completion: f64,
    pub spec_adherence: f64,
    pub legal_standing: f64,
}

/// One project in the developer's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub name: String,
    pub location: String,
    pub unit_type: String,
    pub status: ProjectStatus,
    pub delivery_accuracy: String,
    pub finishing_option: String,
    pub expected_completion: String,
    pub challenges: String,
    /// Percentage, always within 0..=100
    pub construction_progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityReport {
    pub score: f64,
    pub breakdown: ReliabilityBreakdown,
    pub summary: String,
    pub projects: Vec<ProjectRecord>,
    pub sources: Vec<Source>,
    pub defaulted_fields: Vec<String>,
}

impl Report for ReliabilityReport {
    fn defaulted_fields(&self) -> &[String] {
        &self.defaulted_fields
    }
}

fn read_project(item: &mut FieldReader<'_>) -> ProjectRecord {
    ProjectRecord {
        name: item.text("name", "Unnamed project"),
        location: item.text("location", "N/A"),
        unit_type: item.text("unitType", "N/A"),
        status: item.label("status"),
        delivery_accuracy: item.text("deliveryAccuracy", "N/A"),
        finishing_option: item.text("finishingOption", "N/A"),
        expected_completion: item.text("expectedCompletion", "N/A"),
        challenges: item.text("challenges", "N/A"),
        construction_progress: item.bounded("constructionProgress", 0.0, 100.0),
    }
}

impl CapabilityDescriptor for ReliabilityQuery {
    type Report = ReliabilityReport;

    fn capability(&self) -> Capability {
        Capability::EntityReliability
    }

    fn build_request(&self) -> GenerationRequest {
        let prompt = format!(
            "Audit the Egyptian real estate developer \"{entity}\". \
             Review recent construction speed, delivery accuracy, legal disputes and buyer complaints. \
             Return JSON with: score, breakdown{{punctuality, completion, specAdherence, legalStanding}}, \
             summary, projects[{{name, location, unitType, status (Delivered/Under Construction/Launched), \
             deliveryAccuracy, finishingOption, expectedCompletion, challenges, constructionProgress (0-100)}}].",
            entity = self.entity,
        );
        GenerationRequest::new(self.capability().tier(), prompt).with_grounding()
    }

    fn normalize(&self, response: &GenerationResponse) -> ReliabilityReport {
        let payload = parse_payload(response.text.as_deref());
        let mut fields = FieldReader::new(&payload);

        ReliabilityReport {
            score: fields.number("score"),
            breakdown: ReliabilityBreakdown {
                punctuality: fields.number("breakdown.punctuality"),
                completion: fields.number("breakdown.completion"),
                spec_adherence: fields.number("breakdown.specAdherence"),
                legal_standing: fields.number("breakdown.legalStanding"),
            },
            summary: fields.text("summary", "Audit incomplete."),
            projects: fields.objects("projects", read_project),
            sources: extract_sources(&response.raw),
            defaulted_fields: fields.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_empty_payload() {
        let report = ReliabilityQuery::new("Acme Developments").normalize(&GenerationResponse::from_text(""));

        assert_eq!(report.score, 0.0);
        assert_eq!(report.breakdown, ReliabilityBreakdown::default());
        assert_eq!(report.summary, "Audit incomplete.");
        assert!(report.projects.is_empty());
        assert!(report.sources.is_empty());
        assert!(report.is_low_confidence());
    }

    #[test]
    fn test_projects_are_normalized() {
        let text = json!({
            "score": 72,
            "breakdown": { "punctuality": 60, "completion": 80, "specAdherence": 70, "legalStanding": 90 },
            "summary": "Mostly on time",
            "projects": [
                { "name": "Lake View", "status": "Delivered", "constructionProgress": 100 },
                { "name": "Sky Towers", "status": "under construction", "constructionProgress": 140 },
                { "name": "Dunes", "status": "Cancelled", "constructionProgress": -5 }
            ]
        })
        .to_string();

        let report = ReliabilityQuery::new("Acme").normalize(&GenerationResponse::from_text(text));
        assert_eq!(report.breakdown.legal_standing, 90.0);
        assert_eq!(report.projects.len(), 3);
        assert_eq!(report.projects[0].status, ProjectStatus::Delivered);
        assert_eq!(report.projects[1].status, ProjectStatus::UnderConstruction);
        assert_eq!(report.projects[1].construction_progress, 100.0);
        assert_eq!(report.projects[2].status, ProjectStatus::UnderConstruction);
        assert_eq!(report.projects[2].construction_progress, 0.0);
        assert!(report
            .defaulted_fields
            .contains(&"projects[2].status".to_string()));
    }

    #[test]
    fn test_project_status_wire_name() {
        let json = serde_json::to_string(&ProjectStatus::UnderConstruction).unwrap();
        assert_eq!(json, "\"Under Construction\"");
    }
}
