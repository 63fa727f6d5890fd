// tests/pivot/builder_test.rs
use clinistat::config::AnalysisSettings;
use clinistat::indicator::IndicatorDefinition;
use clinistat::model::{AggregationKind, ComputedDataPoint, DomainValue, ValueType};
use clinistat::pivot::{PivotBuilder, PivotTable};
use indexmap::IndexMap;

fn indicator(id: &str, short_name: &str) -> IndicatorDefinition {
    IndicatorDefinition::new(id, id, "test", &["s"], AggregationKind::Count, |_| Vec::new())
        .with_short_name(short_name)
}

fn point(indicator_id: &str, value: f64, dims: &[(&str, &str)]) -> ComputedDataPoint {
    ComputedDataPoint {
        indicator_id: indicator_id.to_string(),
        value,
        dimensions: dims
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        record: None,
    }
}

fn domains() -> IndexMap<String, Vec<DomainValue>> {
    let mut domains = IndexMap::new();
    domains.insert(
        "sex".to_string(),
        vec![DomainValue::new("M", "Male"), DomainValue::new("F", "Female")],
    );
    domains.insert(
        "facility".to_string(),
        vec![DomainValue::new("f1", "One"), DomainValue::new("f2", "Two")],
    );
    domains
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn two_indicator_table(show_percentages: bool) -> PivotTable {
    let a = indicator("a", "A");
    let b = indicator("b", "B");
    let indicators = vec![&a, &b];
    let rows = strings(&["facility"]);
    let columns = strings(&["indicator", "sex"]);
    let domains = domains();
    let settings = AnalysisSettings::default();

    let points = vec![
        point("a", 1.0, &[("facility", "f1"), ("indicator", "A"), ("sex", "F")]),
        point("a", 1.0, &[("facility", "f1"), ("indicator", "A"), ("sex", "M")]),
        point("b", 2.0, &[("facility", "f2"), ("indicator", "B"), ("sex", "F")]),
    ];

    PivotBuilder::new(&rows, &columns, &indicators, &domains, &settings)
        .with_percentages(show_percentages)
        .build(&points)
}

#[test]
fn test_columns_are_complete_and_ordered() {
    let table = two_indicator_table(false);

    let keys: Vec<&str> = table.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["A | M", "A | F", "B | M", "B | F"]);
    assert_eq!(table.columns[1].label, "A | Female");
    assert_eq!(table.columns[1].labels["sex"], "Female");

    let rows: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(rows, vec!["f1", "f2"]);
    assert_eq!(table.rows[1].label, "Two");
}

#[test]
fn test_cells_zero_filled_and_totals_consistent() {
    let table = two_indicator_table(false);

    let f1 = &table.rows[0];
    assert_eq!(f1.cells.len(), 4);
    assert_eq!(f1.cells["A | M"].value, 1.0);
    assert_eq!(f1.cells["B | F"].value, 0.0);
    assert_eq!(f1.cells["B | F"].formatted_value, "0");
    assert_eq!(f1.row_total.value, 2.0);

    assert_eq!(table.column_totals["B | F"].value, 2.0);
    assert_eq!(table.column_totals["B | M"].value, 0.0);
    assert_eq!(table.grand_total.value, 4.0);

    let by_rows: f64 = table.rows.iter().map(|r| r.row_total.value).sum();
    let by_columns: f64 = table.column_totals.values().map(|c| c.value).sum();
    assert_eq!(by_rows, table.grand_total.value);
    assert_eq!(by_columns, table.grand_total.value);
}

#[test]
fn test_percentages_close_to_hundred() {
    let table = two_indicator_table(true);

    assert_eq!(table.rows[0].row_total.percentage, Some(50.0));
    assert_eq!(table.rows[0].cells["A | M"].percentage, Some(25.0));

    let closure: f64 = table
        .rows
        .iter()
        .filter_map(|r| r.row_total.percentage)
        .sum();
    assert!((closure - 100.0).abs() < 1e-9);

    let table = two_indicator_table(false);
    assert!(table.rows[0].cells["A | M"].percentage.is_none());
}

#[test]
fn test_no_row_dimensions_gives_single_total_row() {
    let a = indicator("a", "A");
    let indicators = vec![&a];
    let columns = strings(&["sex"]);
    let domains = domains();
    let settings = AnalysisSettings::default();

    let points = vec![
        point("a", 1.0, &[("sex", "F")]),
        point("a", 1.0, &[("sex", "F")]),
    ];
    let table = PivotBuilder::new(&[], &columns, &indicators, &domains, &settings).build(&points);

    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].key, "Total");
    assert_eq!(table.rows[0].label, "Total");
    assert_eq!(table.rows[0].cells["F"].value, 2.0);
    assert_eq!(table.rows[0].cells["M"].value, 0.0);
}

#[test]
fn test_no_points_still_builds_full_grid() {
    let a = indicator("a", "A");
    let indicators = vec![&a];
    let rows = strings(&["facility"]);
    let columns = strings(&["sex"]);
    let domains = domains();
    let settings = AnalysisSettings::default();

    let table = PivotBuilder::new(&rows, &columns, &indicators, &domains, &settings).build(&[]);

    assert_eq!(table.columns.len(), 2);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.grand_total.value, 0.0);
}

#[test]
fn test_unknown_values_sort_after_domain() {
    let a = indicator("a", "A");
    let indicators = vec![&a];
    let columns = strings(&["sex"]);
    let domains = domains();
    let settings = AnalysisSettings::default();

    let points = vec![point("a", 1.0, &[("sex", "Unknown")]), point("a", 1.0, &[])];
    let table = PivotBuilder::new(&[], &columns, &indicators, &domains, &settings).build(&points);

    let keys: Vec<&str> = table.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["M", "F", "N/A", "Unknown"]);
}

#[test]
fn test_formatting_follows_column_indicator() {
    let count = indicator("n", "Tests");
    let rate = indicator("r", "Rate").with_value_type(ValueType::Percentage);
    let indicators = vec![&count, &rate];
    let columns = strings(&["indicator"]);
    let domains = IndexMap::new();
    let settings = AnalysisSettings::default();

    let points = vec![
        point("n", 1200.0, &[("indicator", "Tests")]),
        point("r", 12.5, &[("indicator", "Rate")]),
    ];
    let table = PivotBuilder::new(&[], &columns, &indicators, &domains, &settings).build(&points);

    let keys: Vec<&str> = table.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["Tests", "Rate"]);
    assert_eq!(table.rows[0].cells["Tests"].formatted_value, "1 200");
    assert_eq!(table.rows[0].cells["Rate"].formatted_value, "12.5%");
    assert_eq!(table.column_totals["Rate"].formatted_value, "12.5%");
}
