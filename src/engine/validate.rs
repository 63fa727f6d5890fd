//! Configuration validation.

use std::collections::{HashMap, HashSet};

use crate::dimension::DimensionRegistry;
use crate::error::{AnalysisError, EngineResult};
use crate::indicator::IndicatorDefinition;
use crate::model::{AnalysisConfig, DimensionUsage, INDICATOR_DIMENSION};

/// Check a configuration against the dimension registry.
///
/// Unknown indicator ids are not an error here; the source planner skips
/// them.
pub fn validate_config(config: &AnalysisConfig, dimensions: &DimensionRegistry) -> EngineResult<()> {
    if config.indicators.is_empty() {
        return Err(AnalysisError::NoIndicators);
    }

    let distinct_indicators: HashSet<&str> =
        config.indicators.iter().map(String::as_str).collect();

    for (list, usage) in [
        (&config.rows, DimensionUsage::Row),
        (&config.columns, DimensionUsage::Column),
    ] {
        let mut seen = HashSet::new();
        for id in list {
            if !seen.insert(id.as_str()) {
                return Err(AnalysisError::DuplicateDimension {
                    dimension: id.clone(),
                    usage,
                });
            }

            if id == INDICATOR_DIMENSION {
                if distinct_indicators.len() < 2 {
                    return Err(AnalysisError::IndicatorDimensionRequiresMultiple);
                }
                continue;
            }

            check_usage(dimensions, id, usage)?;
        }
    }

    if let Some(id) = config.rows.iter().find(|id| config.columns.contains(id)) {
        return Err(AnalysisError::RowColumnOverlap(id.clone()));
    }

    for filter in &config.filters {
        if filter.dimension_id == INDICATOR_DIMENSION {
            return Err(AnalysisError::UnsupportedUsage {
                dimension: filter.dimension_id.clone(),
                usage: DimensionUsage::Filter,
            });
        }
        check_usage(dimensions, &filter.dimension_id, DimensionUsage::Filter)?;
        if filter.values.is_empty() {
            return Err(AnalysisError::InvalidFilter {
                dimension: filter.dimension_id.clone(),
                message: "no values given".to_string(),
            });
        }
    }

    Ok(())
}

/// Check that the selected indicators have distinct short names.
///
/// Short names are the values of the `indicator` dimension; two indicators
/// sharing one would be summed into a single column.
pub fn validate_indicator_names(indicators: &[&IndicatorDefinition]) -> EngineResult<()> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(indicators.len());
    for indicator in indicators {
        if let Some(first) = seen.insert(indicator.short_name.as_str(), indicator.id.as_str()) {
            if first != indicator.id {
                return Err(AnalysisError::IndicatorNameClash {
                    short_name: indicator.short_name.clone(),
                    first: first.to_string(),
                    second: indicator.id.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_usage(dimensions: &DimensionRegistry, id: &str, usage: DimensionUsage) -> EngineResult<()> {
    if dimensions.require(id)?.supports(usage) {
        Ok(())
    } else {
        Err(AnalysisError::UnsupportedUsage {
            dimension: id.to_string(),
            usage,
        })
    }
}
