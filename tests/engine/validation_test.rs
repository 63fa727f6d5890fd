// tests/engine/validation_test.rs
//! Configuration mistakes are rejected before any record is fetched.

use chrono::NaiveDate;
use clinistat::config::Settings;
use clinistat::dimension::{Capabilities, DimensionDefinition, DimensionRegistry, StaticDomain};
use clinistat::engine::validate_config;
use clinistat::fetch::{InMemorySource, RecordSource, SourceCatalog};
use clinistat::indicator::IndicatorRegistry;
use clinistat::model::{
    AnalysisConfig, DimensionKind, DimensionUsage, FilterOperator, FilterSpec, OrgUnitScope,
    PeriodSelection, VisualizationFlags,
};
use clinistat::org_unit::OrgUnitCatalog;
use clinistat::period::PeriodError;
use clinistat::{AnalysisError, AnalyticsEngine};
use std::collections::HashMap;
use std::sync::Arc;

fn config(indicators: &[&str], rows: &[&str], columns: &[&str]) -> AnalysisConfig {
    AnalysisConfig {
        indicators: indicators.iter().map(|s| s.to_string()).collect(),
        rows: rows.iter().map(|s| s.to_string()).collect(),
        columns: columns.iter().map(|s| s.to_string()).collect(),
        filters: Vec::new(),
        period: PeriodSelection::Fixed {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            granularity: None,
        },
        org_units: OrgUnitScope::all(),
        visualization: VisualizationFlags::default(),
    }
}

fn filter(dimension: &str, values: &[&str]) -> FilterSpec {
    FilterSpec {
        dimension_id: dimension.to_string(),
        operator: FilterOperator::In,
        values: values.iter().map(|s| s.to_string()).collect(),
    }
}

fn validate(config: &AnalysisConfig) -> Result<(), AnalysisError> {
    validate_config(config, &DimensionRegistry::builtin())
}

#[test]
fn test_no_indicators() {
    let err = validate(&config(&[], &["facility"], &[])).unwrap_err();
    assert!(matches!(err, AnalysisError::NoIndicators));
    assert!(err.is_configuration_error());
}

#[test]
fn test_unknown_dimension() {
    let err = validate(&config(&["hiv_tests_total"], &["ward"], &[])).unwrap_err();
    assert!(matches!(err, AnalysisError::UnknownDimension(ref id) if id == "ward"));

    let mut with_filter = config(&["hiv_tests_total"], &[], &[]);
    with_filter.filters.push(filter("ward", &["a"]));
    assert!(matches!(
        validate(&with_filter),
        Err(AnalysisError::UnknownDimension(_))
    ));
}

#[test]
fn test_duplicate_dimension() {
    let err = validate(&config(&["hiv_tests_total"], &[], &["sex", "sex"])).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::DuplicateDimension {
            usage: DimensionUsage::Column,
            ..
        }
    ));
}

#[test]
fn test_row_column_overlap() {
    let err = validate(&config(&["hiv_tests_total"], &["sex"], &["sex"])).unwrap_err();
    assert!(matches!(err, AnalysisError::RowColumnOverlap(ref id) if id == "sex"));
}

#[test]
fn test_indicator_dimension_needs_two_indicators() {
    let single = config(&["hiv_tests_total"], &["indicator"], &[]);
    assert!(matches!(
        validate(&single),
        Err(AnalysisError::IndicatorDimensionRequiresMultiple)
    ));

    let pair = config(&["hiv_tests_total", "hiv_tests_positive"], &["indicator"], &["sex"]);
    assert!(validate(&pair).is_ok());
}

#[test]
fn test_indicator_dimension_cannot_filter() {
    let mut config = config(&["hiv_tests_total", "hiv_tests_positive"], &[], &[]);
    config.filters.push(filter("indicator", &["HIV+"]));

    assert!(matches!(
        validate(&config),
        Err(AnalysisError::UnsupportedUsage {
            usage: DimensionUsage::Filter,
            ..
        })
    ));
}

#[test]
fn test_capabilities_are_enforced() {
    let mut registry = DimensionRegistry::builtin();
    registry.register(
        DimensionDefinition::new(
            "ward",
            "Ward",
            DimensionKind::Dynamic,
            |_, _| "general".to_string(),
            StaticDomain::default(),
        )
        .with_capabilities(Capabilities {
            row: true,
            column: false,
            filter: false,
        }),
    );

    assert!(validate_config(&config(&["hiv_tests_total"], &["ward"], &[]), &registry).is_ok());

    let err = validate_config(&config(&["hiv_tests_total"], &[], &["ward"]), &registry)
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::UnsupportedUsage {
            usage: DimensionUsage::Column,
            ..
        }
    ));
    assert_eq!(err.to_string(), "Dimension ward cannot be used as a column dimension");
}

#[test]
fn test_filter_without_values() {
    let mut config = config(&["hiv_tests_total"], &[], &[]);
    config.filters.push(filter("sex", &[]));

    assert!(matches!(
        validate(&config),
        Err(AnalysisError::InvalidFilter { ref dimension, .. }) if dimension == "sex"
    ));
}

#[tokio::test]
async fn test_invalid_config_fetches_nothing() {
    let source = Arc::new(InMemorySource::new(
        HashMap::new(),
        Arc::new(SourceCatalog::default()),
    ));
    let settings = Settings::default();
    let engine = AnalyticsEngine::from_parts(
        Arc::new(settings.clone()),
        Arc::new(DimensionRegistry::builtin()),
        Arc::new(IndicatorRegistry::from_settings(&settings)),
        Arc::new(SourceCatalog::new(&settings.sources)),
        Arc::new(OrgUnitCatalog::default()),
        Arc::clone(&source) as Arc<dyn RecordSource>,
    );

    let overlap = config(&["hiv_tests_total"], &["sex"], &["sex"]);
    assert!(engine.run(&overlap).await.is_err());

    let mut reversed = config(&["hiv_tests_total"], &[], &[]);
    reversed.period = PeriodSelection::Fixed {
        start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        granularity: None,
    };
    let err = engine.run(&reversed).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Period(PeriodError::InvertedRange { .. })));

    assert!(source.requested_sources().await.is_empty());
}

#[tokio::test]
async fn test_shared_short_name_is_rejected() {
    let settings = Settings::from_toml(
        r#"
[[services]]
id = "pf"
label = "Family planning"
source = "planning"

[[services.properties]]
id = "new_acceptors"
label = "New acceptors"
kind = "flag"
field = "nouvelleAcceptante"
"#,
    )
    .unwrap();
    let source = Arc::new(InMemorySource::new(
        HashMap::new(),
        Arc::new(SourceCatalog::default()),
    ));
    let engine = AnalyticsEngine::new(
        settings,
        OrgUnitCatalog::default(),
        Arc::clone(&source) as Arc<dyn RecordSource>,
        None,
    );

    let clash = config(&["fp_new_acceptors", "pf.new_acceptors"], &[], &[]);
    let err = engine.run(&clash).await.unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::IndicatorNameClash { ref short_name, .. } if short_name == "New acceptors"
    ));
    assert!(err.is_configuration_error());
    assert!(source.requested_sources().await.is_empty());

    let distinct = config(&["fp_new_acceptors", "fp_visits"], &[], &[]);
    assert!(engine.run(&distinct).await.is_ok());
}
