use serde::{Deserialize, Serialize};

/// Consultant selectable in the record form together with their team.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConsultantOption {
    pub name: String,
    #[serde(rename = "equipe")]
    pub team: String,
}

/// Service plan selectable in the record form together with its price.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanOption {
    pub name: String,
    #[serde(rename = "value")]
    pub price: f64,
}

/// Reference data describing the valid choices of the record form.
///
/// Fetched once per session and never modified by the client.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FormOptions {
    #[serde(rename = "consultor")]
    pub consultants: Vec<ConsultantOption>,
    #[serde(rename = "plano")]
    pub plans: Vec<PlanOption>,
    #[serde(rename = "servicos")]
    pub services: Vec<String>,
    #[serde(rename = "pacote_sva")]
    pub addon_packages: Vec<String>,
    #[serde(rename = "status")]
    pub statuses: Vec<String>,
}

impl FormOptions {
    /// Team configured for the consultant with the given name.
    pub fn team_for(&self, consultant: &str) -> Option<&str> {
        self.consultants
            .iter()
            .find(|option| option.name == consultant)
            .map(|option| option.team.as_str())
    }

    /// Price configured for the plan with the given name.
    pub fn price_for(&self, plan: &str) -> Option<f64> {
        self.plans
            .iter()
            .find(|option| option.name == plan)
            .map(|option| option.price)
    }
}
