//! Static indicator catalogue.

use super::compute::{self, Predicate};
use super::IndicatorDefinition;
use crate::fetch::source::ids as sources;
use crate::model::{AggregationKind, RecordField, SourceId, ValueType};

const HIV: &str = "hiv";
const FAMILY_PLANNING: &str = "family_planning";
const MATERNAL: &str = "maternal_health";
const PHARMACY: &str = "pharmacy";

fn count(
    id: &str,
    name: &str,
    category: &str,
    source: &str,
    predicate: Predicate,
) -> IndicatorDefinition {
    let read: Vec<SourceId> = vec![source.to_string()];
    IndicatorDefinition::new(id, name, category, &[source], AggregationKind::Count, move |data| {
        compute::count(data, &read, &predicate)
    })
}

fn count_distinct(
    id: &str,
    name: &str,
    category: &str,
    source: &str,
    key: &str,
) -> IndicatorDefinition {
    let read: Vec<SourceId> = vec![source.to_string()];
    let key = RecordField::parse(key);
    IndicatorDefinition::new(
        id,
        name,
        category,
        &[source],
        AggregationKind::CountDistinct,
        move |data| compute::count_distinct(data, &read, &key, &Predicate::Always),
    )
}

fn sum(id: &str, name: &str, category: &str, source: &str, field: &str) -> IndicatorDefinition {
    let read: Vec<SourceId> = vec![source.to_string()];
    let field = RecordField::parse(field);
    IndicatorDefinition::new(id, name, category, &[source], AggregationKind::Sum, move |data| {
        compute::sum(data, &read, &field, &Predicate::Always)
    })
}

/// Every built-in indicator, in catalogue order.
pub fn catalogue() -> Vec<IndicatorDefinition> {
    let hiv_tests_total = count(
        "hiv_tests_total",
        "HIV tests performed",
        HIV,
        sources::HIV_SCREENING,
        Predicate::Always,
    )
    .with_short_name("HIV tests");

    let hiv_tests_positive = count(
        "hiv_tests_positive",
        "Positive HIV tests",
        HIV,
        sources::HIV_SCREENING,
        Predicate::equals("resultat", "positif"),
    )
    .with_short_name("HIV+");

    let hiv_positivity_rate = IndicatorDefinition::ratio(
        "hiv_positivity_rate",
        "HIV positivity rate",
        HIV,
        &hiv_tests_positive,
        &hiv_tests_total,
    )
    .with_short_name("HIV+ %");

    vec![
        hiv_tests_total,
        hiv_tests_positive,
        hiv_positivity_rate,
        count_distinct(
            "hiv_clients_tested",
            "Clients tested for HIV",
            HIV,
            sources::HIV_SCREENING,
            "client.id",
        )
        .with_short_name("Tested clients"),
        count_distinct(
            "arv_patients",
            "Patients in HIV care",
            HIV,
            sources::HIV_CARE,
            "client.id",
        )
        .with_short_name("HIV care"),
        count(
            "fp_visits",
            "Family planning visits",
            FAMILY_PLANNING,
            sources::PLANNING,
            Predicate::Always,
        )
        .with_short_name("FP visits"),
        count_distinct(
            "fp_clients",
            "Family planning clients",
            FAMILY_PLANNING,
            sources::PLANNING,
            "client.id",
        )
        .with_short_name("FP clients"),
        count(
            "fp_new_acceptors",
            "Family planning new acceptors",
            FAMILY_PLANNING,
            sources::PLANNING,
            Predicate::truthy("nouvelleAcceptante"),
        )
        .with_short_name("New acceptors"),
        count(
            "cpn_visits",
            "Antenatal care visits",
            MATERNAL,
            sources::PRENATAL,
            Predicate::Always,
        )
        .with_short_name("ANC visits"),
        count(
            "cpn1_visits",
            "First antenatal care visits",
            MATERNAL,
            sources::PRENATAL,
            Predicate::equals("numeroVisite", "1"),
        )
        .with_short_name("ANC1"),
        count(
            "deliveries",
            "Deliveries",
            MATERNAL,
            sources::DELIVERY,
            Predicate::Always,
        ),
        sum(
            "births",
            "Births",
            MATERNAL,
            sources::DELIVERY,
            "nombreNaissances",
        ),
        sum(
            "prescription_amount",
            "Prescription amount",
            PHARMACY,
            sources::PRESCRIPTION,
            "montantTotal",
        )
        .with_short_name("Amount")
        .with_value_type(ValueType::Currency)
        .with_unit("FCFA"),
    ]
}
