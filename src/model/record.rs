// src/model/record.rs
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use super::types::SourceId;

/// A raw clinical record from one source.
///
/// Only the fields reached through [`RecordField`] descriptors and the
/// source catalog's accessors are meaningful to the engine; everything else
/// is opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Originating source, stamped by the fetcher.
    #[serde(default)]
    pub source: SourceId,
    /// Embedded client sub-object.
    #[serde(default)]
    pub client: Option<Client>,
    /// Service-specific fields.
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new(source: impl Into<SourceId>) -> Self {
        Self {
            source: source.into(),
            client: None,
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// A non-null field value.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).filter(|v| !v.is_null())
    }
}

/// The client a record refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default)]
    pub id: FieldValue,
    #[serde(default)]
    pub sex: FieldValue,
    #[serde(default)]
    pub birth_date: FieldValue,
    #[serde(default)]
    pub status: FieldValue,
}

/// A loosely-typed field value.
///
/// Deserialization never fails: anything that is not a bool, number, string
/// or null lands in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    #[default]
    Null,
    Other(serde_json::Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Other(v) => v.is_null(),
            _ => false,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FieldValue::Text(s) => {
                let s = s.trim().to_lowercase();
                !s.is_empty() && !matches!(s.as_str(), "false" | "0" | "no" | "non")
            }
            FieldValue::Null => false,
            FieldValue::Other(v) => !v.is_null(),
        }
    }

    /// Text view of the value; `None` for null or blank text.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(Cow::Borrowed(trimmed))
            }
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(Cow::Owned(format!("{}", *n as i64)))
                } else {
                    Some(Cow::Owned(n.to_string()))
                }
            }
            FieldValue::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            FieldValue::Null => None,
            FieldValue::Other(v) => (!v.is_null()).then(|| Cow::Owned(v.to_string())),
        }
    }

    /// Date view: `YYYY-MM-DD` (optionally followed by a time part) or `DD/MM/YYYY`.
    pub fn as_date(&self) -> Option<NaiveDate> {
        let FieldValue::Text(s) = self else {
            return None;
        };
        let s = s.trim();
        if let Some(prefix) = s.get(..10) {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return Some(date);
            }
        }
        NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
    }

    /// Case-insensitive match against an expected text value.
    pub fn matches(&self, expected: &str) -> bool {
        self.as_text()
            .is_some_and(|text| text.eq_ignore_ascii_case(expected.trim()))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

// ============================================================================
// Field descriptors
// ============================================================================

/// A field reference resolved once from its configured spelling.
///
/// `client.id`, `client.sex`, `client.birthDate` and `client.status` address
/// the embedded client; anything else is a top-level record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordField {
    Field(String),
    ClientId,
    ClientSex,
    ClientBirthDate,
    ClientStatus,
}

impl RecordField {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "client.id" => RecordField::ClientId,
            "client.sex" => RecordField::ClientSex,
            "client.birthDate" | "client.birth_date" => RecordField::ClientBirthDate,
            "client.status" => RecordField::ClientStatus,
            other => RecordField::Field(other.to_string()),
        }
    }

    /// The non-null value this descriptor points at.
    pub fn resolve<'r>(&self, record: &'r Record) -> Option<&'r FieldValue> {
        let value = match self {
            RecordField::Field(name) => return record.field(name),
            RecordField::ClientId => &record.client.as_ref()?.id,
            RecordField::ClientSex => &record.client.as_ref()?.sex,
            RecordField::ClientBirthDate => &record.client.as_ref()?.birth_date,
            RecordField::ClientStatus => &record.client.as_ref()?.status,
        };
        (!value.is_null()).then_some(value)
    }
}

impl From<String> for RecordField {
    fn from(s: String) -> Self {
        RecordField::parse(&s)
    }
}

impl From<RecordField> for String {
    fn from(field: RecordField) -> Self {
        field.to_string()
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordField::Field(name) => f.write_str(name),
            RecordField::ClientId => f.write_str("client.id"),
            RecordField::ClientSex => f.write_str("client.sex"),
            RecordField::ClientBirthDate => f.write_str("client.birthDate"),
            RecordField::ClientStatus => f.write_str("client.status"),
        }
    }
}

// ============================================================================
// Sex
// ============================================================================

/// Normalized client sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Parse the spellings found in source systems.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "m" | "male" | "masculin" | "homme" | "h" => Some(Sex::Male),
            "f" | "female" | "feminin" | "féminin" | "femme" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}
