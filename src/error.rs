//! Error types for analysis runs.
//!
//! Only malformed *configuration* and transport failures surface as errors.
//! Malformed *data* never does: extractors fall back to sentinel labels and
//! numeric coercion falls back to zero.

use thiserror::Error;

use crate::dimension::DomainError;
use crate::fetch::FetchError;
use crate::model::DimensionUsage;
use crate::period::PeriodError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No indicators selected")]
    NoIndicators,

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("Dimension {dimension} cannot be used as a {usage} dimension")]
    UnsupportedUsage {
        dimension: String,
        usage: DimensionUsage,
    },

    #[error("Dimension {dimension} appears more than once in the {usage} list")]
    DuplicateDimension {
        dimension: String,
        usage: DimensionUsage,
    },

    #[error("Dimension {0} appears in both rows and columns")]
    RowColumnOverlap(String),

    #[error("The indicator dimension requires at least two selected indicators")]
    IndicatorDimensionRequiresMultiple,

    #[error("Indicators {first} and {second} share the short name {short_name}")]
    IndicatorNameClash {
        short_name: String,
        first: String,
        second: String,
    },

    #[error("Invalid filter on {dimension}: {message}")]
    InvalidFilter { dimension: String, message: String },

    #[error("Invalid period: {0}")]
    Period(#[from] PeriodError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Domain lookup failed: {0}")]
    Domain(#[from] DomainError),
}

impl AnalysisError {
    /// Check if this error is a caller configuration mistake.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::Fetch(_) | Self::Domain(_))
    }
}
