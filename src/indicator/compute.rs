//! Reusable compute functions.
//!
//! Every function here is pure: same [`FetchedData`] in, same points out,
//! in record order.

use std::collections::HashSet;

use crate::fetch::FetchedData;
use crate::model::{Record, RecordField, SourceId, ValuePoint};

/// Which records an indicator keeps.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Always,
    /// The field holds a truthy value.
    Truthy(RecordField),
    /// The field equals `value`, case-insensitively.
    Equals { field: RecordField, value: String },
}

impl Predicate {
    pub fn truthy(field: &str) -> Self {
        Predicate::Truthy(RecordField::parse(field))
    }

    pub fn equals(field: &str, value: &str) -> Self {
        Predicate::Equals {
            field: RecordField::parse(field),
            value: value.to_string(),
        }
    }

    pub fn test(&self, record: &Record) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Truthy(field) => field.resolve(record).is_some_and(|v| v.is_truthy()),
            Predicate::Equals { field, value } => {
                field.resolve(record).is_some_and(|v| v.matches(value))
            }
        }
    }
}

/// One point of value 1 per matching record.
pub fn count(data: &FetchedData, sources: &[SourceId], predicate: &Predicate) -> Vec<ValuePoint> {
    data.records_from(sources)
        .filter(|record| predicate.test(record))
        .map(|record| ValuePoint::for_record(1.0, record))
        .collect()
}

/// One point per matching record valued by `field`; non-numeric values
/// count as 0.
pub fn sum(
    data: &FetchedData,
    sources: &[SourceId],
    field: &RecordField,
    predicate: &Predicate,
) -> Vec<ValuePoint> {
    data.records_from(sources)
        .filter(|record| predicate.test(record))
        .map(|record| {
            let value = field
                .resolve(record)
                .and_then(|v| v.as_number())
                .unwrap_or(0.0);
            ValuePoint::for_record(value, record)
        })
        .collect()
}

/// One point of value 1 for the first matching record of each distinct
/// `key`. Records without a key are not counted.
pub fn count_distinct(
    data: &FetchedData,
    sources: &[SourceId],
    key: &RecordField,
    predicate: &Predicate,
) -> Vec<ValuePoint> {
    let mut seen = HashSet::new();
    data.records_from(sources)
        .filter(|record| predicate.test(record))
        .filter_map(|record| {
            let key = key.resolve(record)?.as_text()?.into_owned();
            seen.insert(key).then(|| ValuePoint::for_record(1.0, record))
        })
        .collect()
}

/// A single aggregate point: `sum(numerator) / sum(denominator) * 100`,
/// or 0 when the denominator sums to 0.
pub fn ratio(numerator: &[ValuePoint], denominator: &[ValuePoint]) -> Vec<ValuePoint> {
    let num: f64 = numerator.iter().map(|p| p.value).sum();
    let den: f64 = denominator.iter().map(|p| p.value).sum();
    let value = if den == 0.0 { 0.0 } else { num / den * 100.0 };
    vec![ValuePoint::aggregate(value)]
}
