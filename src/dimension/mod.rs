//! Dimensions: groupable and filterable record attributes.
//!
//! A dimension pairs an extractor `(record, context) -> String` with an
//! asynchronous domain provider listing every value it can take. Extractors
//! never fail; values that cannot be resolved map to a sentinel label.
//!
//! Fixed dimensions (facility, district, region, period) enumerate their
//! domain from the org-unit catalog and the resolved period. Dynamic
//! dimensions (sex, age range, service type and the configured categories)
//! take theirs from configuration or from a [`DomainLookup`].

mod builtin;
mod context;
mod registry;

pub use builtin::{ids, AgeBin, CategoryDefinition};
pub use context::ExtractionContext;
pub use registry::DimensionRegistry;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{DimensionKind, DimensionUsage, DomainValue, Record};
use crate::org_unit::OrgUnitCatalog;
use crate::period::ResolvedPeriod;

/// Result type for domain lookups.
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Lookup for {dimension} failed: {message}")]
    LookupFailed { dimension: String, message: String },
}

/// Per-run inputs available to domain providers.
#[derive(Debug, Clone, Copy)]
pub struct DomainContext<'a> {
    pub org_units: &'a OrgUnitCatalog,
    /// Facility ids the run is scoped to.
    pub facility_ids: &'a [String],
    pub period: &'a ResolvedPeriod,
}

/// Enumerates a dimension's domain.
#[async_trait]
pub trait DomainProvider: Send + Sync {
    async fn values(&self, ctx: &DomainContext<'_>) -> DomainResult<Vec<DomainValue>>;
}

/// External lookup for domains not known from configuration (prescribers, …).
#[async_trait]
pub trait DomainLookup: Send + Sync {
    async fn lookup(&self, dimension_id: &str) -> DomainResult<Vec<DomainValue>>;
}

/// A domain fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticDomain(pub Vec<DomainValue>);

#[async_trait]
impl DomainProvider for StaticDomain {
    async fn values(&self, _ctx: &DomainContext<'_>) -> DomainResult<Vec<DomainValue>> {
        Ok(self.0.clone())
    }
}

/// Extractor signature shared by every dimension.
pub type ExtractorFn = Arc<dyn Fn(&Record, &ExtractionContext) -> String + Send + Sync>;

/// Where a dimension may be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub row: bool,
    pub column: bool,
    pub filter: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        row: true,
        column: true,
        filter: true,
    };
}

/// A registered dimension.
#[derive(Clone)]
pub struct DimensionDefinition {
    pub id: String,
    pub name: String,
    pub kind: DimensionKind,
    pub capabilities: Capabilities,
    extractor: ExtractorFn,
    domain: Arc<dyn DomainProvider>,
}

impl DimensionDefinition {
    pub fn new<F, D>(id: &str, name: &str, kind: DimensionKind, extractor: F, domain: D) -> Self
    where
        F: Fn(&Record, &ExtractionContext) -> String + Send + Sync + 'static,
        D: DomainProvider + 'static,
    {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            capabilities: Capabilities::ALL,
            extractor: Arc::new(extractor),
            domain: Arc::new(domain),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn supports(&self, usage: DimensionUsage) -> bool {
        match usage {
            DimensionUsage::Row => self.capabilities.row,
            DimensionUsage::Column => self.capabilities.column,
            DimensionUsage::Filter => self.capabilities.filter,
        }
    }

    /// Extract this dimension's value from a record.
    pub fn extract(&self, record: &Record, ctx: &ExtractionContext) -> String {
        (self.extractor)(record, ctx)
    }

    /// Enumerate this dimension's domain for a run.
    pub async fn domain(&self, ctx: &DomainContext<'_>) -> DomainResult<Vec<DomainValue>> {
        self.domain.values(ctx).await
    }
}

impl fmt::Debug for DimensionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DimensionDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
