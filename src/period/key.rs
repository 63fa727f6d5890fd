//! Canonical period-key encoding and decoding.

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use std::sync::LazyLock;

use super::{DateRange, Granularity, PeriodError, PeriodResult};

static WEEK_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-S(\d{1,2})$").unwrap());
static MONTH_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());
static QUARTER_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-T([1-4])$").unwrap());
static SEMESTER_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-S([12])$").unwrap());
static YEAR_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").unwrap());

/// Encode the bucket containing `date` as a period key.
pub fn encode(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => date.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let week = date.iso_week();
            format!("{:04}-S{:02}", week.year(), week.week())
        }
        Granularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
        Granularity::Quarter => format!("{:04}-T{}", date.year(), date.month0() / 3 + 1),
        Granularity::Semester => format!("{:04}-S{}", date.year(), date.month0() / 6 + 1),
        Granularity::Year => format!("{:04}", date.year()),
    }
}

/// Decode a period key back into the inclusive range of days it covers.
pub fn decode(key: &str, granularity: Granularity) -> PeriodResult<DateRange> {
    let invalid = || PeriodError::InvalidKey {
        granularity,
        key: key.to_string(),
    };

    let start = match granularity {
        Granularity::Day => NaiveDate::parse_from_str(key, "%Y-%m-%d").map_err(|_| invalid())?,
        Granularity::Week => {
            let (year, week) = captures(&WEEK_KEY, key).ok_or_else(invalid)?;
            NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(invalid)?
        }
        Granularity::Month => {
            let (year, month) = captures(&MONTH_KEY, key).ok_or_else(invalid)?;
            NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?
        }
        Granularity::Quarter => {
            let (year, quarter) = captures(&QUARTER_KEY, key).ok_or_else(invalid)?;
            NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1).ok_or_else(invalid)?
        }
        Granularity::Semester => {
            let (year, half) = captures(&SEMESTER_KEY, key).ok_or_else(invalid)?;
            NaiveDate::from_ymd_opt(year, (half - 1) * 6 + 1, 1).ok_or_else(invalid)?
        }
        Granularity::Year => {
            let year = YEAR_KEY
                .captures(key)
                .and_then(|c| c[1].parse::<i32>().ok())
                .ok_or_else(invalid)?;
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?
        }
    };

    granularity.bucket(start)
}

/// Ordered keys of every bucket overlapping `range`.
pub fn period_keys_between(range: &DateRange, granularity: Granularity) -> Vec<String> {
    let mut keys = Vec::new();
    let mut cursor = granularity.align(range.start);
    while cursor <= range.end {
        keys.push(encode(cursor, granularity));
        match granularity.shift(cursor, 1) {
            Ok(next) => cursor = next,
            Err(_) => break,
        }
    }
    keys
}

fn captures(pattern: &Regex, key: &str) -> Option<(i32, u32)> {
    let caps = pattern.captures(key)?;
    let year = caps[1].parse().ok()?;
    let part = caps[2].parse().ok()?;
    Some((year, part))
}
