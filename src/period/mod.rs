//! Period resolution.
//!
//! Turns a [`PeriodSelection`] into a concrete, inclusive [`DateRange`] and
//! maps calendar buckets to and from their canonical period keys:
//!
//! | granularity | key            |
//! |-------------|----------------|
//! | day         | `2024-03-15`   |
//! | week        | `2024-S11`     |
//! | month       | `2024-03`      |
//! | quarter     | `2024-T1`      |
//! | semester    | `2024-S1`      |
//! | year        | `2024`         |
//!
//! Weeks use ISO numbering (Monday start, ISO year). Encoded week numbers are
//! two digits wide so keys sort chronologically; decoding also accepts the
//! unpadded form (`2024-S5`). Explicit keys are normalized to the encoded form.

mod key;

pub use key::{decode, encode, period_keys_between};

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::PeriodSelection;

/// Result type for period operations.
pub type PeriodResult<T> = Result<T, PeriodError>;

/// Errors raised while resolving periods or decoding period keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("Invalid {granularity} period key: {key}")]
    InvalidKey { granularity: Granularity, key: String },

    #[error("Period start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("Period arithmetic out of range near {0}")]
    OutOfRange(NaiveDate),

    #[error("Unknown granularity: {0}")]
    UnknownGranularity(String),
}

// ============================================================================
// Granularity
// ============================================================================

/// Calendar bucket size used for period keys and relative lookbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Semester,
    Year,
}

impl Granularity {
    /// All granularities, finest first.
    pub const ALL: [Granularity; 6] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::Semester,
        Granularity::Year,
    ];

    /// Number of calendar months in one bucket, for month-based granularities.
    fn months(&self) -> Option<u32> {
        match self {
            Granularity::Day | Granularity::Week => None,
            Granularity::Month => Some(1),
            Granularity::Quarter => Some(3),
            Granularity::Semester => Some(6),
            Granularity::Year => Some(12),
        }
    }

    /// Snap a date to the first day of its bucket.
    pub fn align(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => {
                let offset = date.weekday().num_days_from_monday() as u64;
                date - Days::new(offset)
            }
            _ => {
                let span = self.months().unwrap_or(1);
                let month0 = date.month0() - date.month0() % span;
                // month0 + 1 is always a valid month and day 1 always exists
                NaiveDate::from_ymd_opt(date.year(), month0 + 1, 1).unwrap_or(date)
            }
        }
    }

    /// Move a date by `count` buckets (negative moves backwards).
    pub fn shift(&self, date: NaiveDate, count: i64) -> PeriodResult<NaiveDate> {
        let shifted = match self.months() {
            None => {
                let days = match self {
                    Granularity::Week => count.checked_mul(7),
                    _ => Some(count),
                };
                days.and_then(|d| {
                    let magnitude = Days::new(d.unsigned_abs());
                    if d >= 0 {
                        date.checked_add_days(magnitude)
                    } else {
                        date.checked_sub_days(magnitude)
                    }
                })
            }
            Some(span) => i64::from(span)
                .checked_mul(count)
                .and_then(|m| u32::try_from(m.unsigned_abs()).ok().map(|abs| (m, abs)))
                .and_then(|(m, abs)| {
                    if m >= 0 {
                        date.checked_add_months(Months::new(abs))
                    } else {
                        date.checked_sub_months(Months::new(abs))
                    }
                }),
        };
        shifted.ok_or(PeriodError::OutOfRange(date))
    }

    /// The full bucket containing `date`.
    pub fn bucket(&self, date: NaiveDate) -> PeriodResult<DateRange> {
        let start = self.align(date);
        let next = self.shift(start, 1)?;
        let end = next.pred_opt().ok_or(PeriodError::OutOfRange(next))?;
        Ok(DateRange { start, end })
    }
}

impl FromStr for Granularity {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "quarter" => Ok(Granularity::Quarter),
            "semester" | "half_year" => Ok(Granularity::Semester),
            "year" => Ok(Granularity::Year),
            _ => Err(PeriodError::UnknownGranularity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Granularity {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Semester => "semester",
            Granularity::Year => "year",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Date ranges
// ============================================================================

/// An inclusive range of calendar days (start-of-day to end-of-day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> PeriodResult<Self> {
        if start > end {
            return Err(PeriodError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Smallest range covering both `self` and `other`.
    pub fn envelope(&self, other: &DateRange) -> DateRange {
        DateRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// A period selection resolved against a reference date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    /// Overall date range for fetching.
    pub range: DateRange,
    /// Granularity used for the period dimension.
    pub granularity: Granularity,
    /// Explicitly requested period keys, normalized to their encoded form.
    pub explicit_keys: Option<Vec<String>>,
}

impl ResolvedPeriod {
    /// Ordered period keys forming the period dimension's domain.
    pub fn domain_keys(&self) -> Vec<String> {
        match &self.explicit_keys {
            Some(keys) => {
                let mut keys = keys.clone();
                keys.sort();
                keys.dedup();
                keys
            }
            None => period_keys_between(&self.range, self.granularity),
        }
    }

    /// Whether a period key passes the explicit key selection (if any).
    pub fn allows_key(&self, key: &str) -> bool {
        match &self.explicit_keys {
            Some(keys) => keys.iter().any(|k| k == key),
            None => true,
        }
    }
}

/// Resolve a period selection.
///
/// `default_granularity` is used for fixed periods that do not name one;
/// `today` anchors relative periods.
pub fn resolve_period(
    selection: &PeriodSelection,
    default_granularity: Granularity,
    today: NaiveDate,
) -> PeriodResult<ResolvedPeriod> {
    match selection {
        PeriodSelection::Fixed {
            start,
            end,
            granularity,
        } => Ok(ResolvedPeriod {
            range: DateRange::new(*start, *end)?,
            granularity: granularity.unwrap_or(default_granularity),
            explicit_keys: None,
        }),
        PeriodSelection::Relative {
            granularity,
            lookback_count,
            period_keys,
        } => {
            let keys = period_keys.as_ref().filter(|keys| !keys.is_empty());
            match keys {
                Some(keys) => {
                    let mut range: Option<DateRange> = None;
                    let mut canonical = Vec::with_capacity(keys.len());
                    for key in keys {
                        let bucket = decode(key, *granularity)?;
                        canonical.push(encode(bucket.start, *granularity));
                        range = Some(match range {
                            Some(r) => r.envelope(&bucket),
                            None => bucket,
                        });
                    }
                    // keys is non-empty, so range is always set here
                    let range = range.ok_or(PeriodError::OutOfRange(today))?;
                    Ok(ResolvedPeriod {
                        range,
                        granularity: *granularity,
                        explicit_keys: Some(canonical),
                    })
                }
                None => {
                    let anchor = granularity.align(today);
                    let start = granularity.shift(anchor, -i64::from(*lookback_count))?;
                    Ok(ResolvedPeriod {
                        range: DateRange::new(start, today)?,
                        granularity: *granularity,
                        explicit_keys: None,
                    })
                }
            }
        }
    }
}
