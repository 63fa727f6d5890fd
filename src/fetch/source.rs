//! Source catalog: per-source field accessors.
//!
//! Every source stores its date and org-unit in differently named fields.
//! The catalog parses the configured field names into [`RecordField`]
//! descriptors once, so per-record resolution is a map lookup followed by a
//! short fallback list.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{DomainValue, Record, RecordField, SourceId};

/// Well-known source ids.
pub mod ids {
    pub const PLANNING: &str = "planning";
    pub const PRENATAL: &str = "cpn";
    pub const DELIVERY: &str = "accouchement";
    pub const HIV_SCREENING: &str = "depistageVih";
    pub const HIV_CARE: &str = "pecVih";
    pub const PRESCRIPTION: &str = "ordonnance";
}

/// Configured description of a record source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    pub id: SourceId,
    pub label: String,
    /// Candidate date fields, first non-null wins.
    #[serde(default = "default_date_fields")]
    pub date_fields: Vec<String>,
    /// Candidate org-unit fields, first non-null wins.
    #[serde(default = "default_org_unit_fields")]
    pub org_unit_fields: Vec<String>,
}

fn default_date_fields() -> Vec<String> {
    vec!["date".to_string(), "createdAt".to_string()]
}

fn default_org_unit_fields() -> Vec<String> {
    vec!["etablissementId".to_string(), "facilityId".to_string()]
}

impl SourceDefinition {
    pub fn new(id: &str, label: &str, date_field: &str) -> Self {
        let mut date_fields = vec![date_field.to_string()];
        date_fields.extend(default_date_fields().into_iter().filter(|f| f != date_field));
        Self {
            id: id.to_string(),
            label: label.to_string(),
            date_fields,
            org_unit_fields: default_org_unit_fields(),
        }
    }

    /// The built-in clinical sources.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(ids::PLANNING, "Family planning", "dateConsultation"),
            Self::new(ids::PRENATAL, "Prenatal care", "dateVisite"),
            Self::new(ids::DELIVERY, "Deliveries", "dateAccouchement"),
            Self::new(ids::HIV_SCREENING, "HIV screening", "dateDepistage"),
            Self::new(ids::HIV_CARE, "HIV care", "dateVisite"),
            Self::new(ids::PRESCRIPTION, "Prescriptions", "dateOrdonnance"),
        ]
    }
}

#[derive(Debug, Clone)]
struct SourceAccessors {
    label: String,
    date: Vec<RecordField>,
    org_unit: Vec<RecordField>,
}

impl SourceAccessors {
    fn from_definition(def: &SourceDefinition) -> Self {
        Self {
            label: def.label.clone(),
            date: def.date_fields.iter().map(|f| RecordField::parse(f)).collect(),
            org_unit: def.org_unit_fields.iter().map(|f| RecordField::parse(f)).collect(),
        }
    }
}

/// Accessor table for every known source.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    sources: IndexMap<SourceId, SourceAccessors>,
    fallback: SourceAccessors,
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::new(&SourceDefinition::defaults())
    }
}

impl SourceCatalog {
    pub fn new(definitions: &[SourceDefinition]) -> Self {
        let sources = definitions
            .iter()
            .map(|def| (def.id.clone(), SourceAccessors::from_definition(def)))
            .collect();
        let fallback = SourceAccessors {
            label: String::new(),
            date: default_date_fields().iter().map(|f| RecordField::parse(f)).collect(),
            org_unit: default_org_unit_fields()
                .iter()
                .map(|f| RecordField::parse(f))
                .collect(),
        };
        Self { sources, fallback }
    }

    fn accessors(&self, source: &str) -> &SourceAccessors {
        self.sources.get(source).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    /// Display label of a source (its id when unknown).
    pub fn label<'a>(&'a self, source: &'a str) -> &'a str {
        match self.sources.get(source) {
            Some(acc) => acc.label.as_str(),
            None => source,
        }
    }

    /// Primary date field a fetch should be scoped on.
    pub fn date_field(&self, source: &str) -> String {
        self.accessors(source)
            .date
            .first()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "date".to_string())
    }

    /// The record's date, through its source's accessors.
    pub fn record_date(&self, record: &Record) -> Option<NaiveDate> {
        self.accessors(&record.source)
            .date
            .iter()
            .find_map(|field| field.resolve(record).and_then(|v| v.as_date()))
    }

    /// The record's facility id, through its source's accessors.
    pub fn record_org_unit(&self, record: &Record) -> Option<String> {
        self.accessors(&record.source)
            .org_unit
            .iter()
            .find_map(|field| field.resolve(record).and_then(|v| v.as_text()))
            .map(|id| id.into_owned())
    }

    /// Source ids with labels, in catalog order.
    pub fn domain(&self) -> Vec<DomainValue> {
        self.sources
            .iter()
            .map(|(id, acc)| DomainValue::new(id.clone(), acc.label.clone()))
            .collect()
    }
}
