//! # Clinistat
//!
//! Configuration-driven pivot analytics over clinical service records.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   AnalysisConfig                         │
//! │  (indicators, row/column dimensions, filters, period,    │
//! │   org-unit scope, visualization flags)                   │
//! └─────────────────────────────────────────────────────────┘
//!              │                          │
//!              ▼ [org_unit]               ▼ [period]
//! ┌──────────────────────────┐  ┌──────────────────────────┐
//! │   facility ids           │  │   date range + keys      │
//! └──────────────────────────┘  └──────────────────────────┘
//!              │                          │
//!              └────────────┬─────────────┘
//!                           ▼ [fetch] (pruned, concurrent)
//! ┌─────────────────────────────────────────────────────────┐
//! │                     FetchedData                          │
//! └─────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼ [engine] indicator compute →
//!                           │          dimension extraction → filters
//! ┌─────────────────────────────────────────────────────────┐
//! │                 ComputedDataPoint[]                      │
//! └─────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼ [pivot]
//! ┌─────────────────────────────────────────────────────────┐
//! │     AnalysisResult (columns, rows, totals, %)            │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod indicator;
pub mod model;
pub mod org_unit;
pub mod period;
pub mod pivot;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::dimension::{DimensionDefinition, DimensionRegistry};
    pub use crate::engine::AnalyticsEngine;
    pub use crate::error::{AnalysisError, EngineResult};
    pub use crate::fetch::{InMemorySource, RecordSource, SourceCatalog};
    pub use crate::indicator::{IndicatorDefinition, IndicatorRegistry};
    pub use crate::model::{
        AnalysisConfig, AnalysisResult, FilterOperator, FilterSpec, OrgLevel, OrgUnitScope,
        PeriodSelection, Record, VisualizationFlags,
    };
    pub use crate::org_unit::OrgUnitCatalog;
    pub use crate::period::{DateRange, Granularity};
}

pub use engine::AnalyticsEngine;
pub use error::{AnalysisError, EngineResult};
pub use model::{AnalysisConfig, AnalysisResult};
