//! Indicator registry.

use indexmap::IndexMap;
use tracing::warn;

use super::{catalogue, generator, IndicatorDefinition};
use crate::config::Settings;

/// Every indicator available to a run, in registration order.
#[derive(Debug, Clone, Default)]
pub struct IndicatorRegistry {
    indicators: IndexMap<String, IndicatorDefinition>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The static catalogue plus the indicators generated from
    /// `settings.services`.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut registry = Self::new();
        for indicator in catalogue::catalogue() {
            registry.register(indicator);
        }
        for service in &settings.services {
            for indicator in generator::generate(service) {
                if registry.contains(&indicator.id) {
                    warn!(indicator = %indicator.id, "generated indicator shadows an existing one");
                }
                registry.register(indicator);
            }
        }
        registry
    }

    /// Registry built from default settings.
    pub fn builtin() -> Self {
        Self::from_settings(&Settings::default())
    }

    /// Add an indicator, replacing any previous one with the same id.
    pub fn register(&mut self, indicator: IndicatorDefinition) {
        self.indicators.insert(indicator.id.clone(), indicator);
    }

    pub fn get(&self, id: &str) -> Option<&IndicatorDefinition> {
        self.indicators.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.indicators.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDefinition> {
        self.indicators.values()
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}
