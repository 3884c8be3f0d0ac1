//! Turns raw API documents into canonical records and form options.
//!
//! Both entry points are total: a failed fetch or an unrecognisable payload
//! yields the built-in fallback data together with the reason, so callers
//! always get something to show.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::api::{ApiError, ApiResult};
use crate::domain::form_options::{ConsultantOption, FormOptions, PlanOption};
use crate::domain::record::Record;
use crate::domain::types::{Esteira, Migration};
use crate::services::fallback;

/// Where normalized data came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    Fallback,
}

/// Why a read could not be served from the API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchIssue {
    #[error("{0}")]
    Fetch(#[from] ApiError),

    #[error("Unexpected payload shape: {0}")]
    Shape(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub data: T,
    pub source: DataSource,
    /// Set whenever `source` is [`DataSource::Fallback`].
    pub issue: Option<FetchIssue>,
}

impl<T> Normalized<T> {
    fn remote(data: T) -> Self {
        Self {
            data,
            source: DataSource::Remote,
            issue: None,
        }
    }

    fn fallback(data: T, issue: FetchIssue) -> Self {
        log::warn!("Serving built-in data: {issue}");
        Self {
            data,
            source: DataSource::Fallback,
            issue: Some(issue),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }

    /// Rejects fallback data when the caller does not accept it.
    pub fn into_result(self, allow_fallback: bool) -> Result<Self, FetchIssue> {
        if allow_fallback || !self.is_fallback() {
            return Ok(self);
        }
        Err(self
            .issue
            .unwrap_or_else(|| FetchIssue::Shape("no data".to_string())))
    }
}

/// Object fields checked, in order, for a wrapped record list.
const RECORD_LIST_KEYS: [&str; 3] = ["records", "items", "data"];

const TEXT_FIELDS: &[&str] = &[
    "uf",
    "ddd",
    "adabas",
    "responsavel_p_colocar_na_planilha",
    "data_entrega",
    "crm",
    "simulacao",
    "pedido",
    "razao_social",
    "cnpj",
    "servicos",
    "plano",
    "pacote_sva",
    "m",
    "base_fresh",
    "status",
    "data_do_status",
    "historico",
    "consultor",
    "equipe",
];

const DECIMAL_FIELDS: &[&str] = &[
    "valor_do_plano",
    "valor_do_aparelho",
    "valor_sva",
    "valor_atual",
    "valor_da_renovacao",
];

const COUNT_FIELDS: &[&str] = &["quantidade_aparelho", "qtd_sva", "qtd"];

const TIMESTAMP_FIELDS: &[&str] = &["created_at", "updated_at"];

/// Normalizes the result of `GET /crm/records`.
pub fn normalize_records(fetched: ApiResult<Value>) -> Normalized<Vec<Record>> {
    let payload = match fetched {
        Ok(payload) => payload,
        Err(err) => return Normalized::fallback(fallback::records(), err.into()),
    };

    let Some(raw_records) = unwrap_record_list(payload) else {
        return Normalized::fallback(
            fallback::records(),
            FetchIssue::Shape("expected a list of records".to_string()),
        );
    };

    let received = raw_records.len();
    let mut seen = HashSet::new();
    let records: Vec<Record> = raw_records
        .into_iter()
        .filter_map(normalize_record)
        .filter(|record| {
            let unique = seen.insert(record.id.clone());
            if !unique {
                log::warn!("Skipping duplicate record {}", record.id);
            }
            unique
        })
        .collect();

    if received > 0 && records.is_empty() {
        return Normalized::fallback(
            fallback::records(),
            FetchIssue::Shape(format!("none of the {received} records could be decoded")),
        );
    }

    Normalized::remote(records)
}

/// Normalizes a single record document, e.g. the body returned by a create or
/// update. Returns `None` when the document cannot be read as a record.
pub fn normalize_record(raw: Value) -> Option<Record> {
    let Value::Object(mut fields) = raw else {
        log::warn!("Skipping record that is not a JSON object");
        return None;
    };

    let Some(id) = take_id(&mut fields) else {
        log::warn!("Skipping record without an identifier");
        return None;
    };
    fields.insert("_id".to_string(), Value::String(id));

    canonicalize_fields(&mut fields);

    match serde_json::from_value::<Record>(Value::Object(fields)) {
        Ok(record) => Some(record),
        Err(err) => {
            log::warn!("Skipping record that failed to decode: {err}");
            None
        }
    }
}

/// Wire document of `GET /config`. Absent lists are taken from the defaults.
#[derive(Deserialize)]
struct FormOptionsDocument {
    consultor: Option<Vec<ConsultantOption>>,
    plano: Option<Vec<PlanOption>>,
    servicos: Option<Vec<String>>,
    pacote_sva: Option<Vec<String>>,
    status: Option<Vec<String>>,
}

impl FormOptionsDocument {
    fn is_empty(&self) -> bool {
        self.consultor.is_none()
            && self.plano.is_none()
            && self.servicos.is_none()
            && self.pacote_sva.is_none()
            && self.status.is_none()
    }

    fn merge_over(self, defaults: FormOptions) -> FormOptions {
        FormOptions {
            consultants: self.consultor.unwrap_or(defaults.consultants),
            plans: self.plano.unwrap_or(defaults.plans),
            services: self.servicos.unwrap_or(defaults.services),
            addon_packages: self.pacote_sva.unwrap_or(defaults.addon_packages),
            statuses: self.status.unwrap_or(defaults.statuses),
        }
    }
}

/// Normalizes the result of `GET /config`.
pub fn normalize_config(fetched: ApiResult<Value>) -> Normalized<FormOptions> {
    let mut payload = match fetched {
        Ok(payload @ Value::Object(_)) => payload,
        Ok(_) => {
            return Normalized::fallback(
                fallback::form_options(),
                FetchIssue::Shape("expected a configuration object".to_string()),
            );
        }
        Err(err) => return Normalized::fallback(fallback::form_options(), err.into()),
    };

    if let Some(Value::Array(plans)) = payload.get_mut("plano") {
        for plan in plans.iter_mut() {
            if let Some(price) = plan.get_mut("value") {
                *price = Value::from(coerce_decimal("value", price));
            }
        }
    }

    let document = match serde_json::from_value::<FormOptionsDocument>(payload) {
        Ok(document) => document,
        Err(err) => {
            return Normalized::fallback(
                fallback::form_options(),
                FetchIssue::Shape(format!("invalid configuration: {err}")),
            );
        }
    };

    if document.is_empty() {
        return Normalized::fallback(
            fallback::form_options(),
            FetchIssue::Shape("configuration has none of the expected lists".to_string()),
        );
    }

    Normalized::remote(document.merge_over(fallback::form_options()))
}

fn unwrap_record_list(payload: Value) -> Option<Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(mut fields) => {
            for key in RECORD_LIST_KEYS {
                if let Some(Value::Array(items)) = fields.remove(key) {
                    return Some(items);
                }
            }
            fields.into_iter().find_map(|(_, value)| match value {
                Value::Array(items) => Some(items),
                _ => None,
            })
        }
        _ => None,
    }
}

/// Removes and stringifies the identifier, accepting `_id`, `id` and
/// `{"$oid": ..}` forms.
fn take_id(fields: &mut Map<String, Value>) -> Option<String> {
    let raw = fields.remove("_id").or_else(|| fields.remove("id"))?;
    let id = match raw {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Object(mut nested) => match nested.remove("$oid") {
            Some(Value::String(text)) => text,
            _ => return None,
        },
        _ => return None,
    };
    let id = id.trim().to_string();
    (!id.is_empty()).then_some(id)
}

fn canonicalize_fields(fields: &mut Map<String, Value>) {
    let esteira = fields
        .get("esteira")
        .and_then(Value::as_str)
        .and_then(Esteira::parse_label)
        .unwrap_or_default();
    fields.insert("esteira".to_string(), Value::from(esteira.label()));

    let migration = fields
        .get("migracao")
        .map(Migration::decode)
        .unwrap_or_default();
    fields.insert("migracao".to_string(), Value::from(migration.encode()));

    for key in TEXT_FIELDS {
        if let Some(value) = fields.get_mut(*key) {
            match value {
                Value::Null => *value = Value::from(""),
                Value::Number(number) => *value = Value::from(number.to_string()),
                Value::Bool(flag) => *value = Value::from(flag.to_string()),
                _ => {}
            }
        }
    }

    for key in DECIMAL_FIELDS {
        if let Some(value) = fields.get_mut(*key) {
            *value = Value::from(coerce_decimal(key, value));
        }
    }

    for key in COUNT_FIELDS {
        if let Some(value) = fields.get_mut(*key) {
            let count = coerce_decimal(key, value).max(0.0).round();
            *value = Value::from(count.min(f64::from(u32::MAX)) as u32);
        }
    }

    for key in TIMESTAMP_FIELDS {
        let replacement = match fields.get(*key) {
            Some(Value::Null) => None,
            Some(Value::Number(number)) => Some(Value::from(number.to_string())),
            _ => continue,
        };
        match replacement {
            Some(text) => {
                fields.insert((*key).to_string(), text);
            }
            None => {
                fields.remove(*key);
            }
        }
    }
}

/// Reads a number that may arrive as a JSON number or as text using either
/// decimal separator. Unreadable values become zero.
fn coerce_decimal(field: &str, value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::Null => Some(0.0),
        Value::String(text) => parse_decimal(text),
        _ => None,
    };

    match parsed {
        Some(number) if number.is_finite() => number,
        _ => {
            log::warn!("Replacing unreadable {field} value {value} with 0");
            0.0
        }
    }
}

fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim().trim_start_matches("R$").trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized.parse().ok()
}
