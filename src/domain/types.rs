//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers pin down the canonical in-memory form of values whose wire
//! representation is loose (identifiers, the `esteira` classification and the
//! `migracao` flag), so that once a value reaches the domain layer it can be
//! treated as trusted.
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Identifier assigned to a record by the remote API (`_id` on the wire).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Trims whitespace and rejects empty identifiers.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        Ok(Self(trimmed))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for RecordId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RecordId {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

/// Sales pipeline a record belongs to.
///
/// The remote API does not persist this field, so records coming back from it
/// always fall into [`Esteira::Mobile`].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Esteira {
    #[default]
    #[serde(rename = "Móvel", alias = "Mobile", alias = "Movel")]
    Mobile,
    #[serde(rename = "Fixa", alias = "Fixed")]
    Fixed,
    #[serde(rename = "Avançado", alias = "Advanced", alias = "Avancado")]
    Advanced,
    #[serde(rename = "Energia", alias = "Energy")]
    Energy,
}

impl Esteira {
    pub const ALL: [Esteira; 4] = [
        Esteira::Mobile,
        Esteira::Fixed,
        Esteira::Advanced,
        Esteira::Energy,
    ];

    /// Label shown to users and used as the canonical serialized form.
    pub const fn label(self) -> &'static str {
        match self {
            Esteira::Mobile => "Móvel",
            Esteira::Fixed => "Fixa",
            Esteira::Advanced => "Avançado",
            Esteira::Energy => "Energia",
        }
    }

    /// Parses a label leniently: case-insensitive, with or without accents,
    /// Portuguese or English.
    pub fn parse_label(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "móvel" | "movel" | "mobile" => Some(Esteira::Mobile),
            "fixa" | "fixed" => Some(Esteira::Fixed),
            "avançado" | "avancado" | "advanced" => Some(Esteira::Advanced),
            "energia" | "energy" => Some(Esteira::Energy),
            _ => None,
        }
    }
}

impl Display for Esteira {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical form of the `migracao` flag.
///
/// Different API versions sent the flag as `"SIM"`/`"NÃO"` strings or as
/// `1`/`0` numbers. Wire values go through [`Migration::decode`] on the way in
/// and [`Migration::encode`] on the way out; nothing else sees them.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq, Hash)]
pub enum Migration {
    #[serde(rename = "SIM")]
    Yes,
    #[serde(rename = "NÃO")]
    No,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl Migration {
    /// Resolves any known wire representation. Unrecognised values map to
    /// [`Migration::Unset`].
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Bool(true) => Migration::Yes,
            Value::Bool(false) => Migration::No,
            Value::Number(number) => match number.as_f64() {
                Some(n) if n == 0.0 => Migration::No,
                Some(_) => Migration::Yes,
                None => Migration::Unset,
            },
            Value::String(text) => Self::decode_str(text),
            _ => Migration::Unset,
        }
    }

    /// Resolves a textual flag.
    pub fn decode_str(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "SIM" | "S" | "1" | "TRUE" | "YES" => Migration::Yes,
            "NÃO" | "NAO" | "N" | "0" | "FALSE" | "NO" => Migration::No,
            _ => Migration::Unset,
        }
    }

    /// String form expected by the remote API.
    pub const fn encode(self) -> &'static str {
        match self {
            Migration::Yes => "SIM",
            Migration::No => "NÃO",
            Migration::Unset => "",
        }
    }
}

impl<'de> Deserialize<'de> for Migration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(|value| Self::decode(&value))
    }
}

impl Display for Migration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.encode())
    }
}
