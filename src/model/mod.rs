//! Data model shared by every stage of an analysis run.

pub mod analysis;
pub mod record;
pub mod result;
pub mod types;

pub use analysis::{
    AnalysisConfig, FilterOperator, FilterSpec, OrgLevel, OrgUnitScope, PeriodSelection,
    VisualizationFlags, INDICATOR_DIMENSION, PERIOD_DIMENSION,
};
pub use record::{Client, FieldValue, Record, RecordField, Sex};
pub use result::{AnalysisResult, CellValue, ColumnDef, PivotRow, ResultMetadata};
pub use types::{
    AggregationKind, ComputedDataPoint, DimensionKind, DimensionUsage, DomainValue, SourceId,
    ValuePoint, ValueType,
};
