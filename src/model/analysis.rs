// src/model/analysis.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::Granularity;

/// Reserved pseudo-dimension splitting values by indicator.
pub const INDICATOR_DIMENSION: &str = "indicator";

/// Reserved dimension bucketing records by period key.
pub const PERIOD_DIMENSION: &str = "period";

/// A caller-supplied analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Selected indicator ids, in display order.
    pub indicators: Vec<String>,
    /// Row dimension ids, outermost first.
    #[serde(default)]
    pub rows: Vec<String>,
    /// Column dimension ids, outermost first.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    pub period: PeriodSelection,
    pub org_units: OrgUnitScope,
    #[serde(default)]
    pub visualization: VisualizationFlags,
}

impl AnalysisConfig {
    /// Whether `dimension` is placed on either axis.
    pub fn uses_dimension(&self, dimension: &str) -> bool {
        self.rows.iter().chain(self.columns.iter()).any(|d| d == dimension)
    }
}

/// A filter on a dimension's extracted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub dimension_id: String,
    pub operator: FilterOperator,
    pub values: Vec<String>,
}

impl FilterSpec {
    /// Whether an extracted value passes this filter.
    pub fn accepts(&self, value: &str) -> bool {
        let contained = self.values.iter().any(|v| v == value);
        match self.operator {
            FilterOperator::In => contained,
            FilterOperator::NotIn => !contained,
            FilterOperator::Eq => self.values.first().is_some_and(|v| v == value),
            FilterOperator::Neq => self.values.first().map_or(true, |v| v != value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    In,
    NotIn,
    Eq,
    Neq,
}

/// Which dates an analysis covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PeriodSelection {
    /// Literal date range.
    #[serde(rename_all = "camelCase")]
    Fixed {
        start: NaiveDate,
        end: NaiveDate,
        /// Granularity for the period dimension (settings default if absent).
        #[serde(default)]
        granularity: Option<Granularity>,
    },
    /// Trailing buckets relative to the run date, or explicit period keys.
    #[serde(rename_all = "camelCase")]
    Relative {
        granularity: Granularity,
        #[serde(default)]
        lookback_count: u32,
        #[serde(default)]
        period_keys: Option<Vec<String>>,
    },
}

/// Organizational scope of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnitScope {
    pub level: OrgLevel,
    #[serde(default)]
    pub selected_ids: Vec<String>,
    #[serde(default)]
    pub include_descendants: bool,
}

impl OrgUnitScope {
    /// Every facility in the catalog.
    pub fn all() -> Self {
        Self {
            level: OrgLevel::All,
            selected_ids: Vec::new(),
            include_descendants: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgLevel {
    Facility,
    District,
    Region,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationFlags {
    #[serde(default)]
    pub show_percentages: bool,
    #[serde(default = "default_true")]
    pub show_totals: bool,
}

impl Default for VisualizationFlags {
    fn default() -> Self {
        Self {
            show_percentages: false,
            show_totals: true,
        }
    }
}

fn default_true() -> bool {
    true
}
