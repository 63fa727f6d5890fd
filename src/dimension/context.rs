//! Per-run extraction context.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AnalysisSettings;
use crate::fetch::SourceCatalog;
use crate::model::Record;
use crate::org_unit::OrgUnitCatalog;
use crate::period::{encode, Granularity};

/// Lookup maps and run parameters shared by every extractor.
///
/// Built once per run so that extraction stays O(1) per record.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    facility_district: HashMap<String, String>,
    facility_region: HashMap<String, String>,
    sources: Arc<SourceCatalog>,
    granularity: Granularity,
    reference_date: NaiveDate,
    unknown_label: String,
    not_specified_label: String,
}

impl ExtractionContext {
    pub fn new(
        org_units: &OrgUnitCatalog,
        sources: Arc<SourceCatalog>,
        granularity: Granularity,
        reference_date: NaiveDate,
        settings: &AnalysisSettings,
    ) -> Self {
        let (facility_district, facility_region) = org_units.parent_maps();
        Self {
            facility_district,
            facility_region,
            sources,
            granularity,
            reference_date,
            unknown_label: settings.unknown_label.clone(),
            not_specified_label: settings.not_specified_label.clone(),
        }
    }

    /// Date ages are computed at when a record has no resolvable date.
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn unknown(&self) -> String {
        self.unknown_label.clone()
    }

    pub fn not_specified(&self) -> String {
        self.not_specified_label.clone()
    }

    pub fn record_date(&self, record: &Record) -> Option<NaiveDate> {
        self.sources.record_date(record)
    }

    pub fn facility(&self, record: &Record) -> String {
        self.sources
            .record_org_unit(record)
            .unwrap_or_else(|| self.unknown())
    }

    pub fn district(&self, record: &Record) -> String {
        self.sources
            .record_org_unit(record)
            .and_then(|f| self.facility_district.get(&f).cloned())
            .unwrap_or_else(|| self.unknown())
    }

    pub fn region(&self, record: &Record) -> String {
        self.sources
            .record_org_unit(record)
            .and_then(|f| self.facility_region.get(&f).cloned())
            .unwrap_or_else(|| self.unknown())
    }

    /// Period key of the record's date at the run granularity.
    pub fn period_key(&self, record: &Record) -> String {
        self.record_date(record)
            .map(|date| encode(date, self.granularity))
            .unwrap_or_else(|| self.unknown())
    }
}
