// src/model/result.rs
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::VisualizationFlags;
use crate::period::{DateRange, Granularity};

/// Output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub metadata: ResultMetadata,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<PivotRow>,
    /// Column key -> total over all rows.
    pub column_totals: IndexMap<String, CellValue>,
    pub grand_total: CellValue,
}

impl AnalysisResult {
    /// A well-formed result with no columns and no rows.
    pub fn empty(metadata: ResultMetadata) -> Self {
        Self {
            metadata,
            columns: Vec::new(),
            rows: Vec::new(),
            column_totals: IndexMap::new(),
            grand_total: CellValue::zero(),
        }
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn row(&self, key: &str) -> Option<&PivotRow> {
        self.rows.iter().find(|r| r.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub period: DateRange,
    pub granularity: Granularity,
    /// Facility ids the run was scoped to.
    pub org_units: Vec<String>,
    /// Indicator ids that were actually computed.
    pub indicators: Vec<String>,
    pub visualization: VisualizationFlags,
    pub execution_time_ms: u64,
    pub row_count: usize,
    pub point_count: usize,
}

/// A column of the pivot grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    /// Column dimension id -> value.
    pub dimensions: IndexMap<String, String>,
    /// Column dimension id -> display label.
    pub labels: IndexMap<String, String>,
}

/// A row of the pivot grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotRow {
    pub key: String,
    pub label: String,
    /// Row dimension id -> value.
    pub dimensions: IndexMap<String, String>,
    /// Row dimension id -> display label.
    pub labels: IndexMap<String, String>,
    /// Column key -> cell.
    pub cells: IndexMap<String, CellValue>,
    pub row_total: CellValue,
}

/// An aggregated, formatted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellValue {
    pub value: f64,
    pub formatted_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl CellValue {
    pub fn zero() -> Self {
        Self {
            value: 0.0,
            formatted_value: "0".to_string(),
            percentage: None,
        }
    }
}
