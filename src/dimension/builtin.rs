//! Built-in and configured dimension definitions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{
    DimensionDefinition, DomainContext, DomainLookup, DomainProvider, DomainResult,
    ExtractionContext, StaticDomain,
};
use crate::fetch::SourceCatalog;
use crate::model::{DimensionKind, DomainValue, OrgLevel, Record, RecordField, Sex};

/// Built-in dimension ids.
pub mod ids {
    pub const FACILITY: &str = "facility";
    pub const DISTRICT: &str = "district";
    pub const REGION: &str = "region";
    pub const PERIOD: &str = crate::model::PERIOD_DIMENSION;
    pub const SEX: &str = "sex";
    pub const AGE_RANGE: &str = "age_range";
    pub const SERVICE_TYPE: &str = "service_type";
}

// ============================================================================
// Fixed dimensions
// ============================================================================

/// Org-unit domain restricted to the run's facilities.
struct OrgDomain(OrgLevel);

#[async_trait]
impl DomainProvider for OrgDomain {
    async fn values(&self, ctx: &DomainContext<'_>) -> DomainResult<Vec<DomainValue>> {
        Ok(match self.0 {
            OrgLevel::District => ctx.org_units.district_domain(ctx.facility_ids),
            OrgLevel::Region => ctx.org_units.region_domain(ctx.facility_ids),
            OrgLevel::Facility | OrgLevel::All => ctx.org_units.facility_domain(ctx.facility_ids),
        })
    }
}

/// Period keys of the resolved period (or the explicit keys).
struct PeriodDomain;

#[async_trait]
impl DomainProvider for PeriodDomain {
    async fn values(&self, ctx: &DomainContext<'_>) -> DomainResult<Vec<DomainValue>> {
        Ok(ctx
            .period
            .domain_keys()
            .into_iter()
            .map(|key| DomainValue::new(key.clone(), key))
            .collect())
    }
}

pub(super) fn facility() -> DimensionDefinition {
    DimensionDefinition::new(
        ids::FACILITY,
        "Facility",
        DimensionKind::Fixed,
        |record, ctx| ctx.facility(record),
        OrgDomain(OrgLevel::Facility),
    )
}

pub(super) fn district() -> DimensionDefinition {
    DimensionDefinition::new(
        ids::DISTRICT,
        "District",
        DimensionKind::Fixed,
        |record, ctx| ctx.district(record),
        OrgDomain(OrgLevel::District),
    )
}

pub(super) fn region() -> DimensionDefinition {
    DimensionDefinition::new(
        ids::REGION,
        "Region",
        DimensionKind::Fixed,
        |record, ctx| ctx.region(record),
        OrgDomain(OrgLevel::Region),
    )
}

pub(super) fn period() -> DimensionDefinition {
    DimensionDefinition::new(
        ids::PERIOD,
        "Period",
        DimensionKind::Fixed,
        |record, ctx| ctx.period_key(record),
        PeriodDomain,
    )
}

// ============================================================================
// Dynamic dimensions
// ============================================================================

pub(super) fn sex() -> DimensionDefinition {
    DimensionDefinition::new(
        ids::SEX,
        "Sex",
        DimensionKind::Dynamic,
        |record, ctx| {
            RecordField::ClientSex
                .resolve(record)
                .and_then(|v| v.as_text().and_then(|s| Sex::parse(&s)))
                .map(|sex| sex.code().to_string())
                .unwrap_or_else(|| ctx.unknown())
        },
        StaticDomain(vec![
            DomainValue::new("M", "Male"),
            DomainValue::new("F", "Female"),
        ]),
    )
}

/// An age bin: `min..=max` years, open-ended when `max` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBin {
    pub label: String,
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
}

impl AgeBin {
    pub fn new(label: &str, min: u32, max: Option<u32>) -> Self {
        Self {
            label: label.to_string(),
            min,
            max,
        }
    }

    pub fn contains(&self, age: u32) -> bool {
        age >= self.min && self.max.map_or(true, |max| age <= max)
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("<15", 0, Some(14)),
            Self::new("15-19", 15, Some(19)),
            Self::new("20-24", 20, Some(24)),
            Self::new("25-49", 25, Some(49)),
            Self::new("50+", 50, None),
        ]
    }
}

/// Age of the client at the record's date (or the run's reference date).
fn age_of(record: &Record, ctx: &ExtractionContext) -> Option<u32> {
    let birth = RecordField::ClientBirthDate.resolve(record)?.as_date()?;
    let at = ctx.record_date(record).unwrap_or(ctx.reference_date());
    at.years_since(birth)
}

pub(super) fn age_range(bins: Vec<AgeBin>) -> DimensionDefinition {
    let domain = bins
        .iter()
        .map(|b| DomainValue::new(b.label.clone(), b.label.clone()))
        .collect();
    let bins = Arc::new(bins);
    DimensionDefinition::new(
        ids::AGE_RANGE,
        "Age range",
        DimensionKind::Dynamic,
        move |record, ctx| {
            age_of(record, ctx)
                .and_then(|age| bins.iter().find(|b| b.contains(age)))
                .map(|b| b.label.clone())
                .unwrap_or_else(|| ctx.unknown())
        },
        StaticDomain(domain),
    )
}

pub(super) fn service_type(sources: &SourceCatalog) -> DimensionDefinition {
    DimensionDefinition::new(
        ids::SERVICE_TYPE,
        "Service type",
        DimensionKind::Dynamic,
        |record, ctx| {
            if record.source.is_empty() {
                ctx.unknown()
            } else {
                record.source.clone()
            }
        },
        StaticDomain(sources.domain()),
    )
}

// ============================================================================
// Configured categories
// ============================================================================

/// A categorical dimension read from one record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub id: String,
    pub name: String,
    pub field: RecordField,
    /// Configured domain, in display order.
    #[serde(default)]
    pub values: Vec<DomainValue>,
    /// Resolve the domain through the external lookup when one is available.
    #[serde(default)]
    pub lookup: bool,
}

impl CategoryDefinition {
    fn new(id: &str, name: &str, field: &str, values: &[(&str, &str)]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            field: RecordField::parse(field),
            values: values.iter().map(|(v, l)| DomainValue::new(*v, *l)).collect(),
            lookup: false,
        }
    }

    pub fn defaults() -> Vec<Self> {
        let mut prescriber = Self::new("prescriber", "Prescriber", "prescripteur", &[]);
        prescriber.lookup = true;
        vec![
            Self::new(
                "status",
                "Client status",
                "client.status",
                &[
                    ("nouveau", "New"),
                    ("ancien", "Returning"),
                    ("perdu_de_vue", "Lost to follow-up"),
                ],
            ),
            Self::new(
                "contraception_type",
                "Contraception method",
                "methode",
                &[
                    ("pilule", "Pill"),
                    ("injectable", "Injectable"),
                    ("implant", "Implant"),
                    ("diu", "IUD"),
                    ("preservatif", "Condom"),
                ],
            ),
            Self::new(
                "hiv_result",
                "HIV test result",
                "resultat",
                &[
                    ("positif", "Positive"),
                    ("negatif", "Negative"),
                    ("indetermine", "Indeterminate"),
                ],
            ),
            prescriber,
        ]
    }
}

/// Configured values, or the external lookup when enabled and present.
struct CategoryDomain {
    dimension_id: String,
    values: Vec<DomainValue>,
    lookup: Option<Arc<dyn DomainLookup>>,
}

#[async_trait]
impl DomainProvider for CategoryDomain {
    async fn values(&self, _ctx: &DomainContext<'_>) -> DomainResult<Vec<DomainValue>> {
        match &self.lookup {
            Some(lookup) => lookup.lookup(&self.dimension_id).await,
            None => Ok(self.values.clone()),
        }
    }
}

pub(super) fn category(
    def: &CategoryDefinition,
    lookup: Option<Arc<dyn DomainLookup>>,
) -> DimensionDefinition {
    let field = def.field.clone();
    let known = Arc::new(def.values.clone());
    let extractor_known = Arc::clone(&known);
    DimensionDefinition::new(
        &def.id,
        &def.name,
        DimensionKind::Dynamic,
        move |record, ctx| match field.resolve(record).and_then(|v| v.as_text()) {
            // Normalize to the configured spelling when one matches
            Some(text) => extractor_known
                .iter()
                .find(|d| d.value.eq_ignore_ascii_case(&text))
                .map(|d| d.value.clone())
                .unwrap_or_else(|| text.into_owned()),
            None => ctx.not_specified(),
        },
        CategoryDomain {
            dimension_id: def.id.clone(),
            values: known.as_ref().clone(),
            lookup: if def.lookup { lookup } else { None },
        },
    )
}
