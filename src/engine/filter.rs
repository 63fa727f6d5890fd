//! Filter application.

use crate::dimension::{DimensionDefinition, DimensionRegistry, ExtractionContext};
use crate::error::EngineResult;
use crate::model::{ComputedDataPoint, FilterSpec};
use crate::period::ResolvedPeriod;

/// Keep the points that pass every filter.
///
/// Values are re-derived from the backing record through the dimension's
/// extractor, so a filter works whether or not its dimension is placed on
/// an axis. Points without a backing record (ratio aggregates) always pass.
pub fn apply_filters(
    points: Vec<ComputedDataPoint>,
    filters: &[FilterSpec],
    dimensions: &DimensionRegistry,
    ctx: &ExtractionContext,
) -> EngineResult<Vec<ComputedDataPoint>> {
    if filters.is_empty() {
        return Ok(points);
    }

    let resolved: Vec<(&FilterSpec, &DimensionDefinition)> = filters
        .iter()
        .map(|f| dimensions.require(&f.dimension_id).map(|d| (f, d)))
        .collect::<EngineResult<_>>()?;

    Ok(points
        .into_iter()
        .filter(|point| match &point.record {
            Some(record) => resolved
                .iter()
                .all(|(filter, dimension)| filter.accepts(&dimension.extract(record, ctx))),
            None => true,
        })
        .collect())
}

/// Drop record-backed points whose period key is outside the explicitly
/// selected keys.
pub fn restrict_to_period_keys(
    points: Vec<ComputedDataPoint>,
    period: &ResolvedPeriod,
    ctx: &ExtractionContext,
) -> Vec<ComputedDataPoint> {
    if period.explicit_keys.is_none() {
        return points;
    }
    points
        .into_iter()
        .filter(|point| match &point.record {
            Some(record) => period.allows_key(&ctx.period_key(record)),
            None => true,
        })
        .collect()
}
