// tests/period/period_key_test.rs
use chrono::NaiveDate;
use clinistat::period::{decode, encode, period_keys_between, DateRange, Granularity};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_round_trip_at_year_boundaries_and_leap_day() {
    let dates = [
        date(2023, 12, 31),
        date(2024, 1, 1),
        date(2024, 2, 29),
        date(2024, 12, 31),
        date(2025, 1, 1),
        date(2020, 12, 31),
        date(2021, 1, 1),
    ];

    for granularity in Granularity::ALL {
        for d in dates {
            let key = encode(d, granularity);
            let range = decode(&key, granularity).unwrap();
            assert!(
                range.contains(d),
                "{} at {:?} encoded as {} decodes to {}",
                d,
                granularity,
                key,
                range
            );
        }
    }
}

#[test]
fn test_canonical_keys() {
    let d = date(2024, 8, 15);

    assert_eq!(encode(d, Granularity::Day), "2024-08-15");
    assert_eq!(encode(d, Granularity::Week), "2024-S33");
    assert_eq!(encode(d, Granularity::Month), "2024-08");
    assert_eq!(encode(d, Granularity::Quarter), "2024-T3");
    assert_eq!(encode(d, Granularity::Semester), "2024-S2");
    assert_eq!(encode(d, Granularity::Year), "2024");
}

#[test]
fn test_week_keys_use_iso_year() {
    // Monday 2024-12-30 belongs to ISO week 1 of 2025
    assert_eq!(encode(date(2024, 12, 30), Granularity::Week), "2025-S01");
    // Friday 2021-01-01 belongs to ISO week 53 of 2020
    assert_eq!(encode(date(2021, 1, 1), Granularity::Week), "2020-S53");

    let week = decode("2025-S01", Granularity::Week).unwrap();
    assert_eq!(week.start, date(2024, 12, 30));
    assert_eq!(week.end, date(2025, 1, 5));
}

#[test]
fn test_week_keys_decode_without_padding() {
    let padded = decode("2024-S05", Granularity::Week).unwrap();
    let bare = decode("2024-S5", Granularity::Week).unwrap();

    assert_eq!(bare, padded);
    assert_eq!(bare.start, date(2024, 1, 29));
    assert_eq!(encode(bare.start, Granularity::Week), "2024-S05");
}

#[test]
fn test_decode_bounds() {
    let feb = decode("2024-02", Granularity::Month).unwrap();
    assert_eq!(feb.start, date(2024, 2, 1));
    assert_eq!(feb.end, date(2024, 2, 29));

    let q4 = decode("2023-T4", Granularity::Quarter).unwrap();
    assert_eq!(q4.start, date(2023, 10, 1));
    assert_eq!(q4.end, date(2023, 12, 31));

    let s1 = decode("2024-S1", Granularity::Semester).unwrap();
    assert_eq!(s1.end, date(2024, 6, 30));
}

#[test]
fn test_malformed_keys_rejected() {
    assert!(decode("2024-13", Granularity::Month).is_err());
    assert!(decode("2024-T5", Granularity::Quarter).is_err());
    assert!(decode("2024-S3", Granularity::Semester).is_err());
    assert!(decode("2024-S54", Granularity::Week).is_err());
    assert!(decode("24", Granularity::Year).is_err());
    assert!(decode("2024-02-30", Granularity::Day).is_err());
    assert!(decode("2024-08", Granularity::Quarter).is_err());
}

#[test]
fn test_keys_between_range() {
    let range = DateRange::new(date(2023, 11, 15), date(2024, 2, 1)).unwrap();

    assert_eq!(
        period_keys_between(&range, Granularity::Month),
        vec!["2023-11", "2023-12", "2024-01", "2024-02"]
    );
    assert_eq!(
        period_keys_between(&range, Granularity::Quarter),
        vec!["2023-T4", "2024-T1"]
    );
    assert_eq!(period_keys_between(&range, Granularity::Year), vec!["2023", "2024"]);
}
