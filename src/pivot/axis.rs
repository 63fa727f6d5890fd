//! Axis discovery, completion and ordering.

use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;

use crate::model::{ComputedDataPoint, DomainValue, INDICATOR_DIMENSION};

/// Separator between dimension values in row and column keys.
pub const KEY_SEPARATOR: &str = " | ";

/// One axis (rows or columns) of the grid.
pub(crate) struct Axis<'a> {
    pub dims: &'a [String],
    pub domains: &'a IndexMap<String, Vec<DomainValue>>,
    /// Values of the `indicator` pseudo-dimension, in selection order.
    pub indicator_values: &'a [DomainValue],
    pub missing_label: &'a str,
    pub total_label: &'a str,
}

impl<'a> Axis<'a> {
    /// The point's value for every dimension of this axis.
    pub fn combo(&self, point: &ComputedDataPoint) -> Vec<String> {
        self.dims
            .iter()
            .map(|d| {
                point
                    .dimensions
                    .get(d)
                    .cloned()
                    .unwrap_or_else(|| self.missing_label.to_string())
            })
            .collect()
    }

    pub fn key(&self, combo: &[String]) -> String {
        if self.dims.is_empty() {
            self.total_label.to_string()
        } else {
            combo.join(KEY_SEPARATOR)
        }
    }

    /// Display label of one dimension value.
    pub fn label(&self, dim: &str, value: &str) -> String {
        self.known_domain(dim)
            .and_then(|domain| domain.iter().find(|d| d.value == value))
            .map(|d| d.label.clone())
            .unwrap_or_else(|| value.to_string())
    }

    fn known_domain(&self, dim: &str) -> Option<&'a [DomainValue]> {
        let domain: &'a [DomainValue] = if dim == INDICATOR_DIMENSION {
            self.indicator_values
        } else {
            self.domains.get(dim).map(Vec::as_slice)?
        };
        (!domain.is_empty()).then_some(domain)
    }

    /// Every combination this axis shows, ordered.
    ///
    /// Observed combinations are completed with one entry per selected
    /// indicator and with the Cartesian product of every dimension's domain,
    /// so the grid never depends on which values happen to have data.
    pub fn entries(&self, points: &[ComputedDataPoint]) -> Vec<Vec<String>> {
        if self.dims.is_empty() {
            return vec![Vec::new()];
        }

        let mut combos: IndexSet<Vec<String>> = points.iter().map(|p| self.combo(p)).collect();

        if let Some(pos) = self.dims.iter().position(|d| d == INDICATOR_DIMENSION) {
            let mut others: IndexSet<Vec<String>> = combos
                .iter()
                .map(|combo| {
                    let mut rest = combo.clone();
                    rest.remove(pos);
                    rest
                })
                .collect();
            if self.dims.len() == 1 {
                others.insert(Vec::new());
            }
            for indicator in self.indicator_values {
                for rest in &others {
                    let mut combo = rest.clone();
                    combo.insert(pos, indicator.value.clone());
                    combos.insert(combo);
                }
            }
        }

        let per_dim: Vec<Vec<String>> = self
            .dims
            .iter()
            .enumerate()
            .map(|(i, dim)| match self.known_domain(dim) {
                Some(domain) => domain.iter().map(|d| d.value.clone()).collect(),
                None => combos
                    .iter()
                    .map(|c| c[i].clone())
                    .collect::<IndexSet<_>>()
                    .into_iter()
                    .collect(),
            })
            .collect();
        for combo in cartesian(&per_dim) {
            combos.insert(combo);
        }

        let order = self.sort_order();
        let mut ordered: Vec<Vec<String>> = combos.into_iter().collect();
        ordered.sort_by(|a, b| self.compare(&order, a, b));
        ordered
    }

    /// Indicator first, then each dimension by domain position; values
    /// outside the domain sort after it, lexicographically.
    fn compare(&self, order: &[usize], a: &[String], b: &[String]) -> Ordering {
        for &i in order {
            let ord = self.rank(i, &a[i]).cmp(&self.rank(i, &b[i]));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    fn sort_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.dims.len()).collect();
        if let Some(pos) = self.dims.iter().position(|d| d == INDICATOR_DIMENSION) {
            order.retain(|&i| i != pos);
            order.insert(0, pos);
        }
        order
    }

    fn rank<'v>(&self, index: usize, value: &'v str) -> (usize, &'v str) {
        let position = self
            .known_domain(&self.dims[index])
            .and_then(|domain| domain.iter().position(|d| d.value == value));
        match position {
            Some(p) => (p, ""),
            None => (usize::MAX, value),
        }
    }
}

fn cartesian(lists: &[Vec<String>]) -> Vec<Vec<String>> {
    lists.iter().fold(vec![Vec::new()], |acc, list| {
        acc.iter()
            .flat_map(|prefix| {
                list.iter().map(move |value| {
                    let mut combo = prefix.clone();
                    combo.push(value.clone());
                    combo
                })
            })
            .collect()
    })
}
