//! Shared value types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::record::Record;

/// Identifier of a record source (one clinical service module).
pub type SourceId = String;

/// How an indicator's value-points combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationKind {
    Count,
    Sum,
    CountDistinct,
    Ratio,
}

/// Display type of an indicator's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Decimal,
    Percentage,
    Currency,
}

/// Whether a dimension's domain is independent of clinical data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    /// Org-unit hierarchy levels and time.
    Fixed,
    /// Clinical attributes.
    Dynamic,
}

/// Where a dimension is being used in a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionUsage {
    Row,
    Column,
    Filter,
}

impl fmt::Display for DimensionUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionUsage::Row => f.write_str("row"),
            DimensionUsage::Column => f.write_str("column"),
            DimensionUsage::Filter => f.write_str("filter"),
        }
    }
}

/// One member of a dimension's domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainValue {
    pub value: String,
    pub label: String,
}

impl DomainValue {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A raw value produced by an indicator's compute function.
#[derive(Debug, Clone)]
pub struct ValuePoint {
    pub value: f64,
    /// Backing record; `None` for aggregate points such as ratios.
    pub record: Option<Arc<Record>>,
}

impl ValuePoint {
    pub fn for_record(value: f64, record: &Arc<Record>) -> Self {
        Self {
            value,
            record: Some(Arc::clone(record)),
        }
    }

    pub fn aggregate(value: f64) -> Self {
        Self {
            value,
            record: None,
        }
    }
}

/// A value-point tagged with its indicator and dimension values.
#[derive(Debug, Clone)]
pub struct ComputedDataPoint {
    pub indicator_id: String,
    pub value: f64,
    /// Dimension id -> extracted value.
    pub dimensions: IndexMap<String, String>,
    pub record: Option<Arc<Record>>,
}
