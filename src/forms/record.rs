//! In-progress record form state.
//!
//! Every edit goes through [`RecordForm::apply`], a pure transition that also
//! recomputes the derived fields: choosing a consultant sets the team and
//! choosing a plan sets the plan value.

use validator::Validate;

use crate::domain::form_options::FormOptions;
use crate::domain::record::{Record, RecordFormData};
use crate::domain::types::{Esteira, Migration, RecordId};
use crate::forms::FormError;

/// Free-text fields that can be edited directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextField {
    Uf,
    Ddd,
    Adabas,
    Responsavel,
    DataEntrega,
    Crm,
    Simulacao,
    Pedido,
    RazaoSocial,
    Cnpj,
    Servicos,
    PacoteSva,
    M,
    BaseFresh,
    Status,
    DataDoStatus,
    Historico,
}

/// Monetary fields that can be edited directly. The plan value is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountField {
    ValorDoAparelho,
    ValorSva,
    ValorAtual,
    ValorDaRenovacao,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountField {
    QuantidadeAparelho,
    QtdSva,
    Qtd,
}

/// A single user edit.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldChange {
    Esteira(Esteira),
    Consultant(String),
    Plan(String),
    Migration(Migration),
    Text(TextField, String),
    Amount(AmountField, f64),
    Count(CountField, u32),
}

/// What a submitted form asks the coordinator to do.
#[derive(Clone, Debug, PartialEq)]
pub enum FormSubmission {
    Create(RecordFormData),
    Update(RecordId, RecordFormData),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordForm {
    pub data: RecordFormData,
    /// Identifier of the record being edited; `None` while drafting.
    pub editing: Option<RecordId>,
}

impl Default for RecordForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Team for `consultant`, or `previous` when it is not configured.
pub fn derive_team(options: Option<&FormOptions>, consultant: &str, previous: &str) -> String {
    options
        .and_then(|options| options.team_for(consultant))
        .unwrap_or(previous)
        .to_string()
}

/// Price of `plan`, or `previous` when it is not configured.
pub fn derive_plan_value(options: Option<&FormOptions>, plan: &str, previous: f64) -> f64 {
    options
        .and_then(|options| options.price_for(plan))
        .unwrap_or(previous)
}

impl RecordForm {
    /// Blank form for a new record.
    pub fn new() -> Self {
        Self::from_data(RecordFormData::draft())
    }

    /// Form for new record pre-filled with `data`.
    pub fn from_data(data: RecordFormData) -> Self {
        Self {
            data,
            editing: None,
        }
    }

    /// Form editing an existing record.
    pub fn edit(record: &Record) -> Self {
        Self {
            data: record.form_data(),
            editing: Some(record.id.clone()),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    #[must_use]
    pub fn apply(mut self, change: FieldChange, options: Option<&FormOptions>) -> Self {
        let data = &mut self.data;
        match change {
            FieldChange::Esteira(esteira) => data.esteira = esteira,
            FieldChange::Consultant(name) => {
                data.equipe = derive_team(options, &name, &data.equipe);
                data.consultor = name;
            }
            FieldChange::Plan(name) => {
                data.valor_do_plano = derive_plan_value(options, &name, data.valor_do_plano);
                data.plano = name;
            }
            FieldChange::Migration(flag) => data.migracao = flag,
            FieldChange::Text(field, value) => *text_slot(data, field) = value,
            FieldChange::Amount(field, value) => {
                let slot = match field {
                    AmountField::ValorDoAparelho => &mut data.valor_do_aparelho,
                    AmountField::ValorSva => &mut data.valor_sva,
                    AmountField::ValorAtual => &mut data.valor_atual,
                    AmountField::ValorDaRenovacao => &mut data.valor_da_renovacao,
                };
                *slot = if value.is_finite() { value } else { 0.0 };
            }
            FieldChange::Count(field, value) => {
                let slot = match field {
                    CountField::QuantidadeAparelho => &mut data.quantidade_aparelho,
                    CountField::QtdSva => &mut data.qtd_sva,
                    CountField::Qtd => &mut data.qtd,
                };
                *slot = value;
            }
        }
        self
    }

    /// Recomputes team and plan value from the current selections, e.g. after
    /// loading the data from somewhere other than the form.
    #[must_use]
    pub fn rederive(mut self, options: Option<&FormOptions>) -> Self {
        let data = &mut self.data;
        data.equipe = derive_team(options, &data.consultor, &data.equipe);
        data.valor_do_plano = derive_plan_value(options, &data.plano, data.valor_do_plano);
        self
    }

    /// Validates the form and turns it into a create or update request.
    pub fn submit(&self) -> Result<FormSubmission, FormError> {
        self.data.validate()?;

        Ok(match &self.editing {
            Some(id) => FormSubmission::Update(id.clone(), self.data.clone()),
            None => FormSubmission::Create(self.data.clone()),
        })
    }
}

fn text_slot(data: &mut RecordFormData, field: TextField) -> &mut String {
    match field {
        TextField::Uf => &mut data.uf,
        TextField::Ddd => &mut data.ddd,
        TextField::Adabas => &mut data.adabas,
        TextField::Responsavel => &mut data.responsavel_p_colocar_na_planilha,
        TextField::DataEntrega => &mut data.data_entrega,
        TextField::Crm => &mut data.crm,
        TextField::Simulacao => &mut data.simulacao,
        TextField::Pedido => &mut data.pedido,
        TextField::RazaoSocial => &mut data.razao_social,
        TextField::Cnpj => &mut data.cnpj,
        TextField::Servicos => &mut data.servicos,
        TextField::PacoteSva => &mut data.pacote_sva,
        TextField::M => &mut data.m,
        TextField::BaseFresh => &mut data.base_fresh,
        TextField::Status => &mut data.status,
        TextField::DataDoStatus => &mut data.data_do_status,
        TextField::Historico => &mut data.historico,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::form_options::{ConsultantOption, PlanOption};

    fn options() -> FormOptions {
        FormOptions {
            consultants: vec![ConsultantOption {
                name: "Ana Souza".to_string(),
                team: "Equipe Alfa".to_string(),
            }],
            plans: vec![PlanOption {
                name: "Plano Básico".to_string(),
                price: 99.90,
            }],
            ..FormOptions::default()
        }
    }

    #[test]
    fn selecting_a_plan_sets_its_price() {
        let options = options();
        let form = RecordForm::new().apply(
            FieldChange::Plan("Plano Básico".to_string()),
            Some(&options),
        );

        assert_eq!(form.data.plano, "Plano Básico");
        assert_eq!(form.data.valor_do_plano, 99.90);
    }

    #[test]
    fn selecting_a_consultant_sets_their_team() {
        let options = options();
        let form = RecordForm::new().apply(
            FieldChange::Consultant("Ana Souza".to_string()),
            Some(&options),
        );

        assert_eq!(form.data.consultor, "Ana Souza");
        assert_eq!(form.data.equipe, "Equipe Alfa");
    }

    #[test]
    fn unknown_selections_keep_previous_derived_values() {
        let options = options();
        let form = RecordForm::new()
            .apply(FieldChange::Plan("Plano Básico".to_string()), Some(&options))
            .apply(FieldChange::Consultant("Ana Souza".to_string()), Some(&options))
            .apply(FieldChange::Plan("Plano Extinto".to_string()), Some(&options))
            .apply(FieldChange::Consultant("Zé".to_string()), None);

        assert_eq!(form.data.plano, "Plano Extinto");
        assert_eq!(form.data.valor_do_plano, 99.90);
        assert_eq!(form.data.consultor, "Zé");
        assert_eq!(form.data.equipe, "Equipe Alfa");
    }

    #[test]
    fn direct_edits_touch_only_their_field() {
        let form = RecordForm::new()
            .apply(
                FieldChange::Text(TextField::RazaoSocial, "Acme".to_string()),
                None,
            )
            .apply(FieldChange::Amount(AmountField::ValorAtual, 120.5), None)
            .apply(FieldChange::Amount(AmountField::ValorSva, f64::NAN), None)
            .apply(FieldChange::Count(CountField::Qtd, 4), None)
            .apply(FieldChange::Migration(Migration::Yes), None)
            .apply(FieldChange::Esteira(Esteira::Advanced), None);

        let expected = RecordFormData {
            razao_social: "Acme".to_string(),
            valor_atual: 120.5,
            qtd: 4,
            migracao: Migration::Yes,
            esteira: Esteira::Advanced,
            ..RecordFormData::draft()
        };
        assert_eq!(form.data, expected);
    }

    #[test]
    fn rederive_fills_team_and_price_from_names() {
        let options = options();
        let data = RecordFormData {
            consultor: "Ana Souza".to_string(),
            plano: "Plano Básico".to_string(),
            ..RecordFormData::draft()
        };

        let form = RecordForm::from_data(data).rederive(Some(&options));

        assert_eq!(form.data.equipe, "Equipe Alfa");
        assert_eq!(form.data.valor_do_plano, 99.90);
    }

    #[test]
    fn submit_distinguishes_create_from_update() {
        let draft = RecordForm::new();
        assert!(matches!(draft.submit(), Ok(FormSubmission::Create(_))));

        let record = Record {
            id: RecordId::new("42").unwrap(),
            data: RecordFormData::draft(),
            created_at: Some("2024-01-01".to_string()),
            updated_at: None,
        };
        let editing = RecordForm::edit(&record);
        assert!(editing.is_editing());
        match editing.submit() {
            Ok(FormSubmission::Update(id, _)) => assert_eq!(id.as_str(), "42"),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn submit_rejects_invalid_data() {
        let form = RecordForm::new().apply(
            FieldChange::Text(TextField::Uf, "São Paulo".into()),
            None,
        );
        assert!(matches!(form.submit(), Err(FormError::Validation(_))));
    }
}
