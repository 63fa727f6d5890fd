// tests/period/period_resolve_test.rs
use chrono::NaiveDate;
use clinistat::model::PeriodSelection;
use clinistat::period::{resolve_period, Granularity, PeriodError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_fixed_period_is_literal_range() {
    let selection = PeriodSelection::Fixed {
        start: date(2024, 1, 10),
        end: date(2024, 3, 5),
        granularity: None,
    };

    let resolved = resolve_period(&selection, Granularity::Month, date(2030, 1, 1)).unwrap();

    assert_eq!(resolved.range.start, date(2024, 1, 10));
    assert_eq!(resolved.range.end, date(2024, 3, 5));
    assert_eq!(resolved.granularity, Granularity::Month);
    assert_eq!(resolved.domain_keys(), vec!["2024-01", "2024-02", "2024-03"]);
}

#[test]
fn test_fixed_period_named_granularity_wins() {
    let selection = PeriodSelection::Fixed {
        start: date(2024, 1, 1),
        end: date(2024, 12, 31),
        granularity: Some(Granularity::Quarter),
    };

    let resolved = resolve_period(&selection, Granularity::Month, date(2030, 1, 1)).unwrap();

    assert_eq!(resolved.granularity, Granularity::Quarter);
    assert_eq!(resolved.domain_keys().len(), 4);
}

#[test]
fn test_inverted_fixed_period_rejected() {
    let selection = PeriodSelection::Fixed {
        start: date(2024, 3, 1),
        end: date(2024, 2, 1),
        granularity: None,
    };

    let err = resolve_period(&selection, Granularity::Month, date(2024, 6, 1)).unwrap_err();
    assert!(matches!(err, PeriodError::InvertedRange { .. }));
}

#[test]
fn test_relative_lookback() {
    let selection = PeriodSelection::Relative {
        granularity: Granularity::Month,
        lookback_count: 2,
        period_keys: None,
    };

    let resolved = resolve_period(&selection, Granularity::Day, date(2024, 5, 17)).unwrap();

    assert_eq!(resolved.range.start, date(2024, 3, 1));
    assert_eq!(resolved.range.end, date(2024, 5, 17));
    assert_eq!(resolved.domain_keys(), vec!["2024-03", "2024-04", "2024-05"]);
}

#[test]
fn test_relative_week_lookback_aligns_to_monday() {
    let selection = PeriodSelection::Relative {
        granularity: Granularity::Week,
        lookback_count: 1,
        period_keys: None,
    };

    // Thursday
    let resolved = resolve_period(&selection, Granularity::Month, date(2024, 8, 15)).unwrap();

    assert_eq!(resolved.range.start, date(2024, 8, 5));
    assert_eq!(resolved.range.end, date(2024, 8, 15));
}

#[test]
fn test_explicit_keys_envelope() {
    let selection = PeriodSelection::Relative {
        granularity: Granularity::Quarter,
        lookback_count: 0,
        period_keys: Some(vec!["2024-T3".to_string(), "2023-T4".to_string()]),
    };

    let resolved = resolve_period(&selection, Granularity::Month, date(2025, 1, 1)).unwrap();

    assert_eq!(resolved.range.start, date(2023, 10, 1));
    assert_eq!(resolved.range.end, date(2024, 9, 30));
    assert!(resolved.allows_key("2024-T3"));
    assert!(!resolved.allows_key("2024-T1"));
    assert_eq!(resolved.domain_keys(), vec!["2023-T4", "2024-T3"]);
}

#[test]
fn test_explicit_week_keys_are_normalized() {
    let selection = PeriodSelection::Relative {
        granularity: Granularity::Week,
        lookback_count: 0,
        period_keys: Some(vec!["2024-S5".to_string(), "2024-S10".to_string()]),
    };

    let resolved = resolve_period(&selection, Granularity::Month, date(2025, 1, 1)).unwrap();

    assert_eq!(resolved.range.start, date(2024, 1, 29));
    assert_eq!(resolved.range.end, date(2024, 3, 10));
    assert!(resolved.allows_key("2024-S05"));
    assert_eq!(resolved.domain_keys(), vec!["2024-S05", "2024-S10"]);
}

#[test]
fn test_explicit_malformed_key() {
    let selection = PeriodSelection::Relative {
        granularity: Granularity::Month,
        lookback_count: 0,
        period_keys: Some(vec!["2024-T1".to_string()]),
    };

    let err = resolve_period(&selection, Granularity::Month, date(2025, 1, 1)).unwrap_err();
    assert!(matches!(err, PeriodError::InvalidKey { .. }));
}

#[test]
fn test_period_selection_json() {
    let json = r#"{"type": "relative", "granularity": "month", "lookbackCount": 3}"#;
    let selection: PeriodSelection = serde_json::from_str(json).unwrap();

    assert_eq!(
        selection,
        PeriodSelection::Relative {
            granularity: Granularity::Month,
            lookback_count: 3,
            period_keys: None,
        }
    );
}
