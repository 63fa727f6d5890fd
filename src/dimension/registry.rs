//! Dimension registry.

use indexmap::IndexMap;
use std::sync::Arc;

use super::{builtin, DimensionDefinition, DomainLookup};
use crate::config::Settings;
use crate::error::{AnalysisError, EngineResult};
use crate::fetch::SourceCatalog;

/// Every dimension available to a run, in registration order.
#[derive(Debug, Clone, Default)]
pub struct DimensionRegistry {
    dimensions: IndexMap<String, DimensionDefinition>,
}

impl DimensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the built-in dimensions plus the categories named in `settings`.
    ///
    /// Categories flagged `lookup = true` take their domain from `lookup`
    /// when one is given, otherwise from their configured values.
    pub fn from_settings(
        settings: &Settings,
        sources: &SourceCatalog,
        lookup: Option<Arc<dyn DomainLookup>>,
    ) -> Self {
        let mut registry = Self::new();

        registry.register(builtin::facility());
        registry.register(builtin::district());
        registry.register(builtin::region());
        registry.register(builtin::period());
        registry.register(builtin::sex());
        registry.register(builtin::age_range(settings.age_ranges.clone()));
        registry.register(builtin::service_type(sources));

        for category in &settings.categories {
            registry.register(builtin::category(category, lookup.clone()));
        }

        registry
    }

    /// Registry built from default settings, without an external lookup.
    pub fn builtin() -> Self {
        let settings = Settings::default();
        Self::from_settings(&settings, &SourceCatalog::new(&settings.sources), None)
    }

    /// Add a dimension, replacing any previous one with the same id.
    pub fn register(&mut self, dimension: DimensionDefinition) {
        self.dimensions.insert(dimension.id.clone(), dimension);
    }

    pub fn get(&self, id: &str) -> Option<&DimensionDefinition> {
        self.dimensions.get(id)
    }

    /// Get a dimension or fail with [`AnalysisError::UnknownDimension`].
    pub fn require(&self, id: &str) -> EngineResult<&DimensionDefinition> {
        self.get(id)
            .ok_or_else(|| AnalysisError::UnknownDimension(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.dimensions.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionDefinition> {
        self.dimensions.values()
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}
