//! Grouped column headers.
//!
//! Turns the flat, ordered column list of a result into one header level
//! per column dimension, merging adjacent columns that share a value
//! within the same parent group:
//!
//! ```text
//! ┌───────────────────────┬───────────────────────┐
//! │      HIV tests        │         HIV+          │  level 0 (indicator)
//! ├───────────┬───────────┼───────────┬───────────┤
//! │   Male    │  Female   │   Male    │  Female   │  level 1 (sex)
//! └───────────┴───────────┴───────────┴───────────┘
//! ```

use serde::Serialize;

use crate::model::ColumnDef;

/// One merged header cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderCell {
    pub value: String,
    pub label: String,
    /// Number of leaf columns covered.
    pub span: usize,
}

/// Group `columns` into header levels, outermost dimension first.
///
/// With no column dimensions a single level of column labels is returned.
pub fn group_headers(columns: &[ColumnDef], dims: &[String]) -> Vec<Vec<HeaderCell>> {
    if dims.is_empty() {
        return vec![columns
            .iter()
            .map(|c| HeaderCell {
                value: c.key.clone(),
                label: c.label.clone(),
                span: 1,
            })
            .collect()];
    }

    dims.iter()
        .enumerate()
        .map(|(level, dim)| {
            let mut cells: Vec<HeaderCell> = Vec::new();
            let mut previous: Option<Vec<&str>> = None;

            for column in columns {
                // Path from the outermost dimension down to this level
                let path: Vec<&str> = dims[..=level]
                    .iter()
                    .map(|d| column.dimensions.get(d).map(String::as_str).unwrap_or(""))
                    .collect();

                match cells.last_mut() {
                    Some(last) if previous.as_ref() == Some(&path) => last.span += 1,
                    _ => cells.push(HeaderCell {
                        value: path[level].to_string(),
                        label: column
                            .labels
                            .get(dim)
                            .cloned()
                            .unwrap_or_else(|| path[level].to_string()),
                        span: 1,
                    }),
                }
                previous = Some(path);
            }
            cells
        })
        .collect()
}
