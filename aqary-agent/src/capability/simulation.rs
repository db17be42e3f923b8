//! Investment scenario simulation. Runs on the deep tier without web search.

use serde::{Deserialize, Serialize};

use super::{Capability, CapabilityDescriptor};
use crate::backend::{GenerationRequest, GenerationResponse};
use crate::normalize::{parse_payload, FieldReader};
use crate::request::trim_input;
use crate::response::{Report, RiskLevel};

#[cfg(feature = "typescript")]
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioQuery {
    pub scenario: String,
    /// Budget in EGP
    pub budget: f64,
    pub horizon: String,
}

impl ScenarioQuery {
    pub fn new(scenario: impl AsRef<str>, budget: f64, horizon: impl AsRef<str>) -> Self {
        Self {
            scenario: trim_input(scenario.as_ref()),
            budget,
            horizon: trim_input(horizon.as_ref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub risk_level: RiskLevel,
    pub lock_in_period: String,
    pub worst_case_scenario: String,
    pub upside_potential: String,
    pub recommendation: String,
    pub defaulted_fields: Vec<String>,
}

impl Report for SimulationReport {
    fn defaulted_fields(&self) -> &[String] {
        &self.defaulted_fields
    }
}

impl CapabilityDescriptor for ScenarioQuery {
    type Report = SimulationReport;

    fn capability(&self) -> Capability {
        Capability::ScenarioSimulation
    }

    fn build_request(&self) -> GenerationRequest {
        let prompt = format!(
            "Simulate this Egyptian real estate investment: \"{scenario}\" \
             with a budget of {budget} EGP over {horizon}. \
             Weigh feasibility, expected return and EGP volatility. \
             Return JSON with: riskLevel (Low/Medium/High), lockInPeriod, worstCaseScenario, \
             upsidePotential, recommendation.",
            scenario = self.scenario,
            budget = self.budget,
            horizon = self.horizon,
        );
        GenerationRequest::new(self.capability().tier(), prompt)
    }

    fn normalize(&self, response: &GenerationResponse) -> SimulationReport {
        let payload = parse_payload(response.text.as_deref());
        let mut fields = FieldReader::new(&payload);

        SimulationReport {
            risk_level: fields.label("riskLevel"),
            lock_in_period: fields.text("lockInPeriod", "N/A"),
            worst_case_scenario: fields.text("worstCaseScenario", "Data unavailable."),
            upside_potential: fields.text("upsidePotential", "N/A"),
            recommendation: fields.text("recommendation", "Consult a financial advisor."),
            defaulted_fields: fields.finish(),
        }
    }
}
