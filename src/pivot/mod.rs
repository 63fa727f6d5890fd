//! Pivot table assembly.
//!
//! Turns tagged data points into a complete grid:
//!
//! ```text
//! ComputedDataPoint[]
//!       │
//!       ├── columns: discover → indicator completion → domain completion → order
//!       ├── rows:    discover → indicator completion → domain completion → order
//!       │            (no row dimensions: one "Total" row)
//!       ▼
//! cells (sum per row × column) → row/column/grand totals → percentages
//! ```
//!
//! The grid never depends on which combinations happen to have data: every
//! domain value appears, zero-filled.

mod axis;
mod format;
pub mod header;

pub use axis::KEY_SEPARATOR;
pub use format::ValueFormat;
pub use header::{group_headers, HeaderCell};

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::config::AnalysisSettings;
use crate::indicator::IndicatorDefinition;
use crate::model::{
    CellValue, ColumnDef, ComputedDataPoint, DomainValue, PivotRow, INDICATOR_DIMENSION,
};
use axis::Axis;

/// The grid part of an analysis result.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<PivotRow>,
    pub column_totals: IndexMap<String, CellValue>,
    pub grand_total: CellValue,
}

/// Builds a [`PivotTable`] for one run.
pub struct PivotBuilder<'a> {
    rows: &'a [String],
    columns: &'a [String],
    /// Selected, known indicators in selection order.
    indicators: &'a [&'a IndicatorDefinition],
    /// Dimension id -> resolved domain.
    domains: &'a IndexMap<String, Vec<DomainValue>>,
    settings: &'a AnalysisSettings,
    show_percentages: bool,
    indicator_values: Vec<DomainValue>,
}

impl<'a> PivotBuilder<'a> {
    pub fn new(
        rows: &'a [String],
        columns: &'a [String],
        indicators: &'a [&'a IndicatorDefinition],
        domains: &'a IndexMap<String, Vec<DomainValue>>,
        settings: &'a AnalysisSettings,
    ) -> Self {
        let indicator_values = indicators
            .iter()
            .map(|i| DomainValue::new(i.short_name.clone(), i.short_name.clone()))
            .collect();
        Self {
            rows,
            columns,
            indicators,
            domains,
            settings,
            show_percentages: false,
            indicator_values,
        }
    }

    pub fn with_percentages(mut self, show: bool) -> Self {
        self.show_percentages = show;
        self
    }

    fn axis(&self, dims: &'a [String]) -> Axis<'_> {
        Axis {
            dims,
            domains: self.domains,
            indicator_values: &self.indicator_values,
            missing_label: &self.settings.missing_label,
            total_label: &self.settings.total_label,
        }
    }

    pub fn build(&self, points: &[ComputedDataPoint]) -> PivotTable {
        let column_axis = self.axis(self.columns);
        let row_axis = self.axis(self.rows);

        // 1-4: columns
        let columns: Vec<ColumnDef> = column_axis
            .entries(points)
            .into_iter()
            .map(|combo| self.column_def(&column_axis, combo))
            .collect();

        // 5: rows
        let row_entries = row_axis.entries(points);

        // 6: cells
        let mut sums: HashMap<(String, String), f64> = HashMap::new();
        for point in points {
            let row_key = row_axis.key(&row_axis.combo(point));
            let column_key = column_axis.key(&column_axis.combo(point));
            *sums.entry((row_key, column_key)).or_insert(0.0) += point.value;
        }

        let column_formats: Vec<Option<ValueFormat>> = columns
            .iter()
            .map(|c| self.indicator_format(c.dimensions.get(INDICATOR_DIMENSION)))
            .collect();
        let default_format = self.default_format();

        let mut rows: Vec<PivotRow> = Vec::with_capacity(row_entries.len());
        for combo in row_entries {
            let key = row_axis.key(&combo);
            let (dimensions, labels) = dimension_maps(&row_axis, &combo);
            let row_format = self.indicator_format(dimensions.get(INDICATOR_DIMENSION));

            let mut cells = IndexMap::with_capacity(columns.len());
            let mut row_total = 0.0;
            for (column, column_format) in columns.iter().zip(&column_formats) {
                let value = sums
                    .get(&(key.clone(), column.key.clone()))
                    .copied()
                    .unwrap_or(0.0);
                row_total += value;
                let format = column_format
                    .as_ref()
                    .or(row_format.as_ref())
                    .unwrap_or(&default_format);
                cells.insert(column.key.clone(), cell(value, format));
            }

            let label = if self.rows.is_empty() {
                self.settings.total_label.clone()
            } else {
                labels.values().cloned().collect::<Vec<_>>().join(KEY_SEPARATOR)
            };

            rows.push(PivotRow {
                key,
                label,
                dimensions,
                labels,
                cells,
                row_total: cell(row_total, row_format.as_ref().unwrap_or(&default_format)),
            });
        }

        // 7: totals
        let mut column_totals = IndexMap::with_capacity(columns.len());
        for (column, column_format) in columns.iter().zip(&column_formats) {
            let total: f64 = rows
                .iter()
                .filter_map(|r| r.cells.get(&column.key))
                .map(|c| c.value)
                .sum();
            let format = column_format.as_ref().unwrap_or(&default_format);
            column_totals.insert(column.key.clone(), cell(total, format));
        }
        let grand: f64 = column_totals.values().map(|c| c.value).sum();
        let grand_total = cell(grand, &default_format);

        // 8: percentages of the grand total
        if self.show_percentages {
            let share = |value: f64| if grand == 0.0 { 0.0 } else { value / grand * 100.0 };
            for row in &mut rows {
                for c in row.cells.values_mut() {
                    c.percentage = Some(share(c.value));
                }
                row.row_total.percentage = Some(share(row.row_total.value));
            }
            for c in column_totals.values_mut() {
                c.percentage = Some(share(c.value));
            }
        }

        PivotTable {
            columns,
            rows,
            column_totals,
            grand_total,
        }
    }

    fn column_def(&self, axis: &Axis<'_>, combo: Vec<String>) -> ColumnDef {
        let key = axis.key(&combo);
        let (dimensions, labels) = dimension_maps(axis, &combo);
        let label = if self.columns.is_empty() {
            self.indicators
                .first()
                .map(|i| i.short_name.clone())
                .unwrap_or_else(|| self.settings.total_label.clone())
        } else {
            labels.values().cloned().collect::<Vec<_>>().join(KEY_SEPARATOR)
        };
        ColumnDef {
            key,
            label,
            dimensions,
            labels,
        }
    }

    /// Format of the indicator named by an `indicator` dimension value.
    fn indicator_format(&self, short_name: Option<&String>) -> Option<ValueFormat> {
        let short_name = short_name?;
        self.indicators
            .iter()
            .find(|i| &i.short_name == short_name)
            .map(|i| self.format_of(i))
    }

    fn default_format(&self) -> ValueFormat {
        self.indicators
            .first()
            .map(|i| self.format_of(i))
            .unwrap_or_else(ValueFormat::integer)
    }

    fn format_of(&self, indicator: &IndicatorDefinition) -> ValueFormat {
        ValueFormat::new(
            indicator.value_type,
            indicator.unit.clone(),
            self.settings.decimal_places,
        )
    }
}

fn dimension_maps(
    axis: &Axis<'_>,
    combo: &[String],
) -> (IndexMap<String, String>, IndexMap<String, String>) {
    let mut dimensions = IndexMap::with_capacity(combo.len());
    let mut labels = IndexMap::with_capacity(combo.len());
    for (dim, value) in axis.dims.iter().zip(combo) {
        labels.insert(dim.clone(), axis.label(dim, value));
        dimensions.insert(dim.clone(), value.clone());
    }
    (dimensions, labels)
}

fn cell(value: f64, format: &ValueFormat) -> CellValue {
    CellValue {
        value,
        formatted_value: format.format(value),
        percentage: None,
    }
}
