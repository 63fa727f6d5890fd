//! Indicators generated from service property sets.
//!
//! Each configured service names one source and a list of properties. Every
//! property becomes an indicator `{service}.{property}`; properties marked
//! `total = true` also feed a `{service}.total` indicator whose points are
//! the concatenation of theirs.

use serde::{Deserialize, Serialize};

use super::compute::{self, Predicate};
use super::IndicatorDefinition;
use crate::fetch::source::ids as sources;
use crate::fetch::FetchedData;
use crate::model::{AggregationKind, RecordField, SourceId, ValuePoint, ValueType};

/// How a property is computed from its service's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PropertyRule {
    /// Count records whose field is truthy.
    Flag { field: RecordField },
    /// Sum a numeric field.
    Sum { field: RecordField },
    /// Count records whose field equals `value`.
    Match { field: RecordField, value: String },
}

impl PropertyRule {
    pub fn flag(field: &str) -> Self {
        PropertyRule::Flag {
            field: RecordField::parse(field),
        }
    }

    pub fn sum(field: &str) -> Self {
        PropertyRule::Sum {
            field: RecordField::parse(field),
        }
    }

    pub fn matches(field: &str, value: &str) -> Self {
        PropertyRule::Match {
            field: RecordField::parse(field),
            value: value.to_string(),
        }
    }

    fn aggregation(&self) -> AggregationKind {
        match self {
            PropertyRule::Sum { .. } => AggregationKind::Sum,
            PropertyRule::Flag { .. } | PropertyRule::Match { .. } => AggregationKind::Count,
        }
    }

    fn value_type(&self) -> ValueType {
        match self {
            PropertyRule::Sum { .. } => ValueType::Decimal,
            PropertyRule::Flag { .. } | PropertyRule::Match { .. } => ValueType::Integer,
        }
    }

    fn points(&self, data: &FetchedData, read: &[SourceId]) -> Vec<ValuePoint> {
        match self {
            PropertyRule::Flag { field } => {
                compute::count(data, read, &Predicate::Truthy(field.clone()))
            }
            PropertyRule::Sum { field } => compute::sum(data, read, field, &Predicate::Always),
            PropertyRule::Match { field, value } => compute::count(
                data,
                read,
                &Predicate::Equals {
                    field: field.clone(),
                    value: value.clone(),
                },
            ),
        }
    }
}

/// One generated indicator of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(flatten)]
    pub rule: PropertyRule,
    /// Whether this property contributes to `{service}.total`.
    #[serde(default)]
    pub total: bool,
    #[serde(default)]
    pub unit: Option<String>,
}

/// A service whose properties generate indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: String,
    pub label: String,
    pub source: SourceId,
    /// Category tag of the generated indicators; defaults to the service id.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

impl ServiceDefinition {
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                id: "pf".to_string(),
                label: "Family planning".to_string(),
                source: sources::PLANNING.to_string(),
                category: Some("family_planning".to_string()),
                properties: vec![
                    property("pill", "Pill", PropertyRule::matches("methode", "pilule"), true),
                    property(
                        "injectable",
                        "Injectable",
                        PropertyRule::matches("methode", "injectable"),
                        true,
                    ),
                    property("implant", "Implant", PropertyRule::matches("methode", "implant"), true),
                    property("counselling", "Counselling", PropertyRule::flag("conseling"), false),
                ],
            },
            Self {
                id: "cpn".to_string(),
                label: "Antenatal care".to_string(),
                source: sources::PRENATAL.to_string(),
                category: Some("maternal_health".to_string()),
                properties: vec![
                    property("iron", "Iron supplementation", PropertyRule::flag("fer"), true),
                    property("ipt", "Preventive treatment", PropertyRule::flag("tpi"), true),
                    property("bed_net", "Bed nets", PropertyRule::flag("moustiquaire"), true),
                ],
            },
            Self {
                id: "ordonnance".to_string(),
                label: "Prescriptions".to_string(),
                source: sources::PRESCRIPTION.to_string(),
                category: Some("pharmacy".to_string()),
                properties: vec![property(
                    "items",
                    "Items prescribed",
                    PropertyRule::sum("nombreArticles"),
                    false,
                )],
            },
        ]
    }
}

fn property(id: &str, label: &str, rule: PropertyRule, total: bool) -> PropertyDefinition {
    PropertyDefinition {
        id: id.to_string(),
        label: label.to_string(),
        short_name: None,
        rule,
        total,
        unit: None,
    }
}

/// Generate the indicators of one service.
pub fn generate(service: &ServiceDefinition) -> Vec<IndicatorDefinition> {
    let category = service.category.as_deref().unwrap_or(&service.id);
    let read: Vec<SourceId> = vec![service.source.clone()];
    let mut generated = Vec::with_capacity(service.properties.len() + 1);

    for prop in &service.properties {
        let rule = prop.rule.clone();
        let read = read.clone();
        let mut indicator = IndicatorDefinition::new(
            &format!("{}.{}", service.id, prop.id),
            &format!("{}: {}", service.label, prop.label),
            category,
            &[service.source.as_str()],
            rule.aggregation(),
            move |data| rule.points(data, &read),
        )
        .with_short_name(prop.short_name.as_deref().unwrap_or(&prop.label))
        .with_value_type(prop.rule.value_type());
        if let Some(unit) = &prop.unit {
            indicator = indicator.with_unit(unit);
        }
        generated.push(indicator);
    }

    let contributing: Vec<PropertyRule> = service
        .properties
        .iter()
        .filter(|p| p.total)
        .map(|p| p.rule.clone())
        .collect();

    if !contributing.is_empty() {
        let aggregation = if contributing.iter().all(|r| r.aggregation() == AggregationKind::Count) {
            AggregationKind::Count
        } else {
            AggregationKind::Sum
        };
        let value_type = if aggregation == AggregationKind::Count {
            ValueType::Integer
        } else {
            ValueType::Decimal
        };
        generated.push(
            IndicatorDefinition::new(
                &format!("{}.total", service.id),
                &format!("{}: total", service.label),
                category,
                &[service.source.as_str()],
                aggregation,
                move |data| {
                    contributing
                        .iter()
                        .flat_map(|rule| rule.points(data, &read))
                        .collect()
                },
            )
            .with_short_name(&format!("{} total", service.label))
            .with_value_type(value_type),
        );
    }

    generated
}
