//! Indicators: named, pure computations over fetched records.
//!
//! An indicator declares the sources it reads and a compute function
//! `(FetchedData) -> Vec<ValuePoint>`. Record-backed points (count, sum,
//! distinct count) keep a handle on their record so the engine can extract
//! dimension values from it; ratio points are aggregates with no record.
//!
//! Two producers feed the [`IndicatorRegistry`]:
//! - the static catalogue in [`catalogue`]
//! - the service-property generator in [`generator`]

pub mod catalogue;
pub mod compute;
pub mod generator;
mod registry;

pub use compute::Predicate;
pub use generator::{PropertyDefinition, PropertyRule, ServiceDefinition};
pub use registry::IndicatorRegistry;

use std::fmt;
use std::sync::Arc;

use crate::fetch::FetchedData;
use crate::model::{AggregationKind, SourceId, ValuePoint, ValueType};

/// Compute function shared by every indicator.
pub type ComputeFn = Arc<dyn Fn(&FetchedData) -> Vec<ValuePoint> + Send + Sync>;

/// Numerator and denominator of a ratio indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatioRef {
    pub numerator: String,
    pub denominator: String,
}

/// A registered indicator.
#[derive(Clone)]
pub struct IndicatorDefinition {
    pub id: String,
    pub name: String,
    /// Compact label, also the value of the `indicator` pseudo-dimension.
    pub short_name: String,
    pub category: String,
    /// Sources the compute function reads.
    pub sources: Vec<SourceId>,
    pub aggregation: AggregationKind,
    pub value_type: ValueType,
    pub unit: Option<String>,
    pub ratio: Option<RatioRef>,
    compute: ComputeFn,
}

impl IndicatorDefinition {
    pub fn new<F>(
        id: &str,
        name: &str,
        category: &str,
        sources: &[&str],
        aggregation: AggregationKind,
        compute: F,
    ) -> Self
    where
        F: Fn(&FetchedData) -> Vec<ValuePoint> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            short_name: name.to_string(),
            category: category.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            aggregation,
            value_type: match aggregation {
                AggregationKind::Ratio => ValueType::Percentage,
                _ => ValueType::Integer,
            },
            unit: None,
            ratio: None,
            compute: Arc::new(compute),
        }
    }

    /// A ratio of two indicators, as a percentage.
    ///
    /// Reads the union of both operands' sources.
    pub fn ratio(
        id: &str,
        name: &str,
        category: &str,
        numerator: &IndicatorDefinition,
        denominator: &IndicatorDefinition,
    ) -> Self {
        let mut sources: Vec<SourceId> = numerator.sources.clone();
        for source in &denominator.sources {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }

        let num = Arc::clone(&numerator.compute);
        let den = Arc::clone(&denominator.compute);

        Self {
            id: id.to_string(),
            name: name.to_string(),
            short_name: name.to_string(),
            category: category.to_string(),
            sources,
            aggregation: AggregationKind::Ratio,
            value_type: ValueType::Percentage,
            unit: Some("%".to_string()),
            ratio: Some(RatioRef {
                numerator: numerator.id.clone(),
                denominator: denominator.id.clone(),
            }),
            compute: Arc::new(move |data: &FetchedData| compute::ratio(&num(data), &den(data))),
        }
    }

    pub fn with_short_name(mut self, short_name: &str) -> Self {
        self.short_name = short_name.to_string();
        self
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// Run the compute function.
    pub fn compute(&self, data: &FetchedData) -> Vec<ValuePoint> {
        (self.compute)(data)
    }
}

impl fmt::Debug for IndicatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("short_name", &self.short_name)
            .field("sources", &self.sources)
            .field("aggregation", &self.aggregation)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}
