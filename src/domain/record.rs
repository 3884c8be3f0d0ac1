use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::types::{Esteira, Migration, RecordId};

/// Status assigned to freshly drafted records.
pub const DEFAULT_STATUS: &str = "Ativo";

/// Mutable projection of a [`Record`]: everything except the identifier and
/// the server-assigned timestamps. Used for create and update payloads.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default = "RecordFormData::draft")]
pub struct RecordFormData {
    /// Client-side pipeline classification, never persisted remotely.
    pub esteira: Esteira,
    #[validate(length(max = 2))]
    pub uf: String,
    #[validate(length(max = 2))]
    pub ddd: String,
    pub adabas: String,
    pub responsavel_p_colocar_na_planilha: String,
    pub data_entrega: String,
    pub crm: String,
    pub simulacao: String,
    pub pedido: String,
    pub razao_social: String,
    pub cnpj: String,
    pub servicos: String,
    pub plano: String,
    /// Derived from the selected plan.
    #[validate(range(min = 0.0))]
    pub valor_do_plano: f64,
    pub quantidade_aparelho: u32,
    #[validate(range(min = 0.0))]
    pub valor_do_aparelho: f64,
    pub qtd_sva: u32,
    pub pacote_sva: String,
    #[validate(range(min = 0.0))]
    pub valor_sva: f64,
    #[validate(range(min = 0.0))]
    pub valor_atual: f64,
    #[validate(range(min = 0.0))]
    pub valor_da_renovacao: f64,
    pub m: String,
    pub migracao: Migration,
    pub base_fresh: String,
    pub qtd: u32,
    pub status: String,
    pub data_do_status: String,
    pub historico: String,
    pub consultor: String,
    /// Derived from the selected consultant.
    pub equipe: String,
}

impl RecordFormData {
    /// Blank data for a new record.
    #[must_use]
    pub fn draft() -> Self {
        Self {
            status: DEFAULT_STATUS.to_string(),
            ..Self::default()
        }
    }
}

/// One CRM entry as served by the remote API.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub data: RecordFormData,
    /// Assigned by the API on creation.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Refreshed by the API on every successful update.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Record {
    /// Copy of the mutable part of the record.
    #[must_use]
    pub fn form_data(&self) -> RecordFormData {
        self.data.clone()
    }

    /// Returns whether any searchable field contains `needle`.
    ///
    /// `needle` must already be lower-cased.
    pub fn matches_search(&self, needle: &str) -> bool {
        [
            &self.data.razao_social,
            &self.data.cnpj,
            &self.data.consultor,
            &self.data.plano,
            &self.data.status,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}
