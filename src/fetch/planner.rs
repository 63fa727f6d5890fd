//! Source planning: the minimal source set for a selection of indicators.

use std::collections::{BTreeSet, HashSet};
use tracing::warn;

use crate::indicator::IndicatorRegistry;
use crate::model::SourceId;

/// Sources to fetch for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePlan {
    /// Union of the known indicators' declared sources.
    pub sources: BTreeSet<SourceId>,
    /// Selected indicator ids present in the registry, deduplicated, in
    /// selection order.
    pub indicators: Vec<String>,
    /// Selected indicator ids missing from the registry.
    pub skipped: Vec<String>,
}

/// Plan the sources needed by `selected`.
///
/// Ids missing from the registry (renamed or removed indicators in an older
/// saved configuration) are skipped rather than failing the run.
pub fn plan_sources(selected: &[String], registry: &IndicatorRegistry) -> SourcePlan {
    let mut plan = SourcePlan::default();
    let mut seen = HashSet::new();

    for id in selected {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match registry.get(id) {
            Some(indicator) => {
                plan.sources.extend(indicator.sources.iter().cloned());
                plan.indicators.push(id.clone());
            }
            None => {
                warn!(indicator = %id, "skipping unknown indicator");
                plan.skipped.push(id.clone());
            }
        }
    }

    plan
}
