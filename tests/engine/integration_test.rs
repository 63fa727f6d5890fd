// tests/engine/integration_test.rs
//! End-to-end runs through the engine with an in-memory record source.

use chrono::NaiveDate;
use clinistat::config::Settings;
use clinistat::fetch::source::ids as sources;
use clinistat::fetch::{InMemorySource, RecordSource, SourceCatalog};
use clinistat::model::{
    AnalysisConfig, Client, FilterOperator, FilterSpec, OrgLevel, OrgUnitScope, PeriodSelection,
    Record, SourceId, VisualizationFlags,
};
use clinistat::org_unit::{Facility, OrgUnit, OrgUnitCatalog};
use clinistat::period::Granularity;
use clinistat::{AnalysisError, AnalyticsEngine};
use std::collections::HashMap;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn org_units() -> OrgUnitCatalog {
    OrgUnitCatalog {
        regions: vec![OrgUnit {
            id: "r1".to_string(),
            name: "Maritime".to_string(),
            region_id: None,
        }],
        districts: vec![OrgUnit {
            id: "d1".to_string(),
            name: "Golfe".to_string(),
            region_id: Some("r1".to_string()),
        }],
        facilities: vec![
            Facility {
                id: "f1".to_string(),
                name: "CMS Be".to_string(),
                district_id: Some("d1".to_string()),
                region_id: None,
            },
            Facility {
                id: "f2".to_string(),
                name: "CMS Tokoin".to_string(),
                district_id: Some("d1".to_string()),
                region_id: None,
            },
        ],
    }
}

fn screening(facility: &str, day: &str, result: &str, sex: &str) -> Record {
    Record::new(sources::HIV_SCREENING)
        .with_field("etablissementId", facility)
        .with_field("dateDepistage", day)
        .with_field("resultat", result)
        .with_client(Client {
            sex: sex.into(),
            ..Client::default()
        })
}

fn records() -> HashMap<SourceId, Vec<Record>> {
    let mut records = HashMap::new();
    records.insert(
        sources::HIV_SCREENING.to_string(),
        vec![
            screening("f1", "2024-01-10", "positif", "F"),
            screening("f1", "2024-01-22", "negatif", "F"),
        ],
    );
    records.insert(
        sources::PLANNING.to_string(),
        vec![Record::new(sources::PLANNING)
            .with_field("etablissementId", "f1")
            .with_field("dateConsultation", "2024-01-05")],
    );
    records
}

fn engine_with(source: InMemorySource) -> (AnalyticsEngine, Arc<InMemorySource>) {
    let source = Arc::new(source);
    let engine = AnalyticsEngine::new(
        Settings::default(),
        org_units(),
        Arc::clone(&source) as Arc<dyn RecordSource>,
        None,
    );
    (engine, source)
}

fn engine() -> (AnalyticsEngine, Arc<InMemorySource>) {
    engine_with(InMemorySource::new(records(), Arc::new(SourceCatalog::default())))
}

fn january(indicators: &[&str], rows: &[&str], columns: &[&str]) -> AnalysisConfig {
    AnalysisConfig {
        indicators: indicators.iter().map(|s| s.to_string()).collect(),
        rows: rows.iter().map(|s| s.to_string()).collect(),
        columns: columns.iter().map(|s| s.to_string()).collect(),
        filters: Vec::new(),
        period: PeriodSelection::Fixed {
            start: date(2024, 1, 1),
            end: date(2024, 1, 31),
            granularity: None,
        },
        org_units: OrgUnitScope::all(),
        visualization: VisualizationFlags::default(),
    }
}

#[tokio::test]
async fn test_hiv_screening_scenario() {
    let (engine, _) = engine();
    let config = january(
        &["hiv_tests_total", "hiv_tests_positive", "hiv_positivity_rate"],
        &[],
        &[],
    );

    let result = engine.run(&config).await.unwrap();

    let keys: Vec<&str> = result.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["HIV tests", "HIV+", "HIV+ %"]);
    assert_eq!(result.rows.len(), 1);

    let row = &result.rows[0];
    assert_eq!(row.cells["HIV tests"].value, 2.0);
    assert_eq!(row.cells["HIV+"].value, 1.0);
    assert_eq!(row.cells["HIV+ %"].value, 50.0);
    assert_eq!(row.cells["HIV+ %"].formatted_value, "50.0%");
    assert_eq!(result.metadata.indicators.len(), 3);
    assert_eq!(result.metadata.granularity, Granularity::Month);
}

#[tokio::test]
async fn test_only_required_sources_are_fetched() {
    let (engine, source) = engine();
    let config = january(&["hiv_tests_total", "hiv_tests_positive"], &[], &[]);

    engine.run(&config).await.unwrap();

    assert_eq!(source.requested_sources().await, vec![sources::HIV_SCREENING]);
}

#[tokio::test]
async fn test_sex_columns_always_present() {
    let (engine, _) = engine();
    let config = january(&["hiv_tests_total"], &["facility"], &["sex"]);

    let result = engine.run(&config).await.unwrap();

    let keys: Vec<&str> = result.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["M", "F"]);

    let rows: Vec<&str> = result.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(rows, vec!["f1", "f2"]);
    assert_eq!(result.rows[0].cells["F"].value, 2.0);
    assert_eq!(result.rows[1].row_total.value, 0.0);
    assert_eq!(result.grand_total.value, 2.0);
}

#[tokio::test]
async fn test_implicit_indicator_column_is_appended() {
    let (engine, _) = engine();
    let config = january(&["hiv_tests_total", "hiv_tests_positive"], &[], &["sex"]);

    let result = engine.run(&config).await.unwrap();

    let keys: Vec<&str> = result.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["M | HIV tests", "F | HIV tests", "M | HIV+", "F | HIV+"]
    );
    let dims: Vec<&str> = result.columns[0]
        .dimensions
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(dims, vec!["sex", "indicator"]);
    assert_eq!(result.rows[0].cells["F | HIV tests"].value, 2.0);
    assert_eq!(result.rows[0].cells["F | HIV+"].value, 1.0);
}

#[tokio::test]
async fn test_runs_are_idempotent() {
    let (engine, _) = engine();
    let mut config = january(&["hiv_tests_total", "fp_visits"], &["period"], &["sex"]);
    config.visualization.show_percentages = true;

    let first = engine.run(&config).await.unwrap();
    let second = engine.run(&config).await.unwrap();

    assert_eq!(first.columns, second.columns);
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.column_totals, second.column_totals);
    assert_eq!(first.grand_total, second.grand_total);
    assert_ne!(first.metadata.run_id, second.metadata.run_id);
}

#[tokio::test]
async fn test_filter_reextracts_from_record() {
    let mut records = records();
    records
        .get_mut(sources::HIV_SCREENING)
        .unwrap()
        .push(screening("f2", "2024-01-15", "negatif", "M"));
    let (engine, _) = engine_with(InMemorySource::new(records, Arc::new(SourceCatalog::default())));

    let mut config = january(&["hiv_tests_total"], &[], &[]);
    config.filters.push(FilterSpec {
        dimension_id: "sex".to_string(),
        operator: FilterOperator::In,
        values: vec!["M".to_string()],
    });

    let result = engine.run(&config).await.unwrap();

    assert_eq!(result.grand_total.value, 1.0);
}

#[tokio::test]
async fn test_empty_scope_returns_empty_result() {
    let (engine, source) = engine();
    let mut config = january(&["hiv_tests_total"], &["facility"], &["sex"]);
    config.org_units = OrgUnitScope {
        level: OrgLevel::Region,
        selected_ids: vec!["nowhere".to_string()],
        include_descendants: true,
    };

    let result = engine.run(&config).await.unwrap();

    assert!(result.columns.is_empty());
    assert!(result.rows.is_empty());
    assert_eq!(result.grand_total.value, 0.0);
    assert!(source.requested_sources().await.is_empty());
}

#[tokio::test]
async fn test_explicit_period_keys_drop_other_periods() {
    let mut records = records();
    records
        .get_mut(sources::HIV_SCREENING)
        .unwrap()
        .push(screening("f1", "2024-02-10", "negatif", "M"));
    records
        .get_mut(sources::HIV_SCREENING)
        .unwrap()
        .push(screening("f1", "2024-03-10", "negatif", "M"));
    let (engine, _) = engine_with(InMemorySource::new(records, Arc::new(SourceCatalog::default())));

    let mut config = january(&["hiv_tests_total"], &["period"], &[]);
    config.period = PeriodSelection::Relative {
        granularity: Granularity::Month,
        lookback_count: 0,
        period_keys: Some(vec!["2024-03".to_string(), "2024-01".to_string()]),
    };

    let result = engine.run_at(&config, date(2024, 6, 1)).await.unwrap();

    let rows: Vec<&str> = result.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(rows, vec!["2024-01", "2024-03"]);
    assert_eq!(result.grand_total.value, 3.0);
}

#[tokio::test]
async fn test_unknown_indicator_is_skipped() {
    let (engine, _) = engine();
    let config = january(&["retired_indicator", "hiv_tests_total"], &[], &[]);

    let result = engine.run(&config).await.unwrap();

    assert_eq!(result.metadata.indicators, vec!["hiv_tests_total"]);
    assert_eq!(result.columns.len(), 1);
    assert_eq!(result.grand_total.value, 2.0);
}

#[tokio::test]
async fn test_fetch_failure_propagates() {
    let source = InMemorySource::new(records(), Arc::new(SourceCatalog::default()))
        .with_failing_source(sources::HIV_SCREENING);
    let (engine, _) = engine_with(source);

    let err = engine
        .run(&january(&["hiv_tests_total"], &[], &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Fetch(_)));
    assert!(!err.is_configuration_error());
}

#[tokio::test]
async fn test_config_from_json() {
    let (engine, _) = engine();
    let json = r#"{
        "indicators": ["hiv_tests_total"],
        "rows": ["district"],
        "columns": ["hiv_result"],
        "filters": [{"dimensionId": "facility", "operator": "eq", "values": ["f1"]}],
        "period": {"type": "fixed", "start": "2024-01-01", "end": "2024-01-31"},
        "orgUnits": {"level": "district", "selectedIds": ["d1"], "includeDescendants": true},
        "visualization": {"showPercentages": true}
    }"#;
    let config: AnalysisConfig = serde_json::from_str(json).unwrap();

    let result = engine.run(&config).await.unwrap();

    assert_eq!(result.metadata.org_units, vec!["f1", "f2"]);
    assert!(result.metadata.visualization.show_totals);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].label, "Golfe");
    assert_eq!(result.column_totals["positif"].value, 1.0);
    assert_eq!(result.column_totals["positif"].percentage, Some(50.0));

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["metadata"]["runId"].is_string());
    assert!(json["rows"][0]["rowTotal"]["formattedValue"].is_string());
}
