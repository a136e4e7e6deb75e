//! Unit tests for query orchestration.

use super::*;
use rstest::{fixture, rstest};
use wikirepo_core::test_support::{FetchCounter, MemoryStore, item, labelled, quantity, text, time};
use wikirepo_core::{CONTAINS_TERRITORY, Claim, POINT_IN_TIME, Scalar, TimeError};

const GERMANY: EntityId = EntityId::item(183);
const NORWAY: EntityId = EntityId::item(20);
const BAVARIA: EntityId = EntityId::item(980);
const SAXONY: EntityId = EntityId::item(1202);
const EUROPEAN_UNION: EntityId = EntityId::item(458);
const UNITED_NATIONS: EntityId = EntityId::item(1065);

const POPULATION: EntityId = EntityId::property(1082);
const ISO_ALPHA2: EntityId = EntityId::property(297);
const ISO_SUBDIVISION: EntityId = EntityId::property(300);
const MEMBER_OF: EntityId = EntityId::property(463);

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date")
}

fn population(amount: &str, day: &str) -> Claim {
    Claim::new(quantity(amount)).with_qualifier(POINT_IN_TIME, time(day))
}

fn store() -> MemoryStore {
    MemoryStore::with_entities([
        labelled(GERMANY, "Germany")
            .with_claim(POPULATION, population("+80523746", "2009-12-31"))
            .with_claim(POPULATION, population("+81802257", "2010-12-31"))
            .with_claim(ISO_ALPHA2, Claim::new(text("DE")))
            .with_claim(CONTAINS_TERRITORY, Claim::new(item(980)))
            .with_claim(CONTAINS_TERRITORY, Claim::new(item(1202)))
            .with_claim(MEMBER_OF, Claim::new(item(458)))
            .with_claim(MEMBER_OF, Claim::new(item(1065))),
        labelled(NORWAY, "Norway").with_claim(MEMBER_OF, Claim::new(item(1065))),
        labelled(BAVARIA, "Bavaria").with_claim(ISO_SUBDIVISION, Claim::new(text("DE-BY"))),
        labelled(SAXONY, "Saxony"),
        labelled(EUROPEAN_UNION, "European Union"),
        labelled(UNITED_NATIONS, "United Nations"),
    ])
}

#[fixture]
fn cache() -> EntityCache {
    EntityCache::new(store())
}

fn request(json: &str) -> QueryRequest {
    QueryRequest::from_json(json).expect("valid request")
}

fn run(json: &str, cache: &mut EntityCache) -> Result<Table, QueryError> {
    query_at(&request(json), cache, &PropertyRegistry::standard(), today())
}

fn texts(table: &Table, name: &str) -> Vec<String> {
    table
        .column(name)
        .expect("column exists")
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

const GERMANY_POPULATION: &str = r#"{
    "locations": ["Q183"],
    "interval": "yearly",
    "timespan": {"range": {"start": "2009-01-01", "end": "2010-01-01"}},
    "properties": {"demographic": ["population"]}
}"#;

#[rstest]
fn population_over_two_years_yields_two_rows(mut cache: EntityCache) {
    let table = run(GERMANY_POPULATION, &mut cache).expect("query succeeds");

    assert_eq!(table.columns(), ["location", "qid", "year", "population"]);
    assert_eq!(table.len(), 2);
    assert_eq!(texts(&table, "location"), ["Germany", "Germany"]);
    assert_eq!(texts(&table, "year"), ["2010", "2009"]);
    assert_eq!(table.cell(0, "population").ok(), Some(&Scalar::Int(81_802_257)));
    assert_eq!(table.cell(1, "population").ok(), Some(&Scalar::Int(80_523_746)));
}

#[rstest]
fn sub_region_abbreviations_fill_or_stay_missing(mut cache: EntityCache) {
    let table = run(
        r#"{
            "locations": ["Q183"],
            "depth": 1,
            "interval": "yearly",
            "timespan": {"range": {"start": "2009-01-01", "end": "2010-01-01"}},
            "properties": {"misc": ["sub_country_abbr"]}
        }"#,
        &mut cache,
    )
    .expect("query succeeds");

    assert_eq!(
        table.columns(),
        ["location", "sub_lctn", "qid", "year", "sub_abbr"]
    );
    assert_eq!(texts(&table, "sub_lctn"), ["Bavaria", "Bavaria", "Saxony", "Saxony"]);
    assert_eq!(texts(&table, "qid"), ["Q980", "Q980", "Q1202", "Q1202"]);
    assert_eq!(
        table.column("sub_abbr").expect("column exists"),
        [
            &Scalar::from("DE-BY"),
            &Scalar::Missing,
            &Scalar::Missing,
            &Scalar::Missing,
        ]
    );
}

#[rstest]
fn categories_join_into_one_table(mut cache: EntityCache) {
    let table = run(
        r#"{
            "locations": ["Q183"],
            "interval": "yearly",
            "timespan": {"range": {"start": "2009-01-01", "end": "2010-01-01"}},
            "properties": {"demographic": ["population"], "misc": ["country_abbr"]}
        }"#,
        &mut cache,
    )
    .expect("query succeeds");

    assert_eq!(
        table.columns(),
        ["location", "qid", "year", "population", "abbr"]
    );
    assert_eq!(table.len(), 2);
    assert_eq!(table.cell(0, "abbr").ok(), Some(&Scalar::from("DE")));
}

#[rstest]
fn memberships_are_renamed_and_filled_with_false(mut cache: EntityCache) {
    let table = run(
        r#"{
            "locations": ["Q183", "Q20"],
            "properties": {"institutional": ["org_membership"]}
        }"#,
        &mut cache,
    )
    .expect("query succeeds");

    assert_eq!(table.columns(), ["location", "qid", "mem_eu", "mem_un"]);
    assert_eq!(texts(&table, "location"), ["Germany", "Norway"]);
    assert_eq!(
        table.column("mem_eu").expect("column exists"),
        [&Scalar::Bool(true), &Scalar::Bool(false)]
    );
    assert_eq!(
        table.column("mem_un").expect("column exists"),
        [&Scalar::Bool(true), &Scalar::Bool(true)]
    );
}

#[rstest]
fn most_recent_values_carry_their_date(mut cache: EntityCache) {
    let table = run(
        r#"{"locations": ["Q183"], "properties": {"demographic": ["population"]}}"#,
        &mut cache,
    )
    .expect("query succeeds");

    assert_eq!(table.columns(), ["location", "qid", "population"]);
    assert_eq!(
        table.cell(0, "population").ok(),
        Some(&Scalar::from("81802257 (2010-12-31)"))
    );
}

#[rstest]
fn no_properties_return_the_skeleton(mut cache: EntityCache) {
    let table = run(
        r#"{"locations": ["Q183"], "interval": "yearly",
            "timespan": {"range": {"start": "2009-01-01", "end": "2010-01-01"}}}"#,
        &mut cache,
    )
    .expect("query succeeds");

    assert_eq!(table.columns(), ["location", "qid", "year"]);
    assert_eq!(table.len(), 2);
}

#[rstest]
#[case::unknown_property(
    r#"{"locations": ["Q183"], "properties": {"demographic": ["gdp"]}}"#
)]
#[case::wrong_category(
    r#"{"locations": ["Q183"], "properties": {"economic": ["population"]}}"#
)]
fn registry_errors_precede_fetching(#[case] json: &str) {
    let store = store();
    let fetches: FetchCounter = store.fetch_counter();
    let mut cache = EntityCache::new(store);

    let err = run(json, &mut cache).expect_err("invalid property");

    assert!(matches!(err, QueryError::Registry(_)), "got {err}");
    assert_eq!(fetches.get(), 0);
}

#[rstest]
fn timespans_require_an_interval(mut cache: EntityCache) {
    let err = run(
        r#"{"locations": ["Q183"], "timespan": {"single": "2010-01-01"}}"#,
        &mut cache,
    )
    .expect_err("timespan without interval");

    assert!(matches!(
        err,
        QueryError::Time(TimeError::TimespanWithoutInterval)
    ));
}

#[rstest]
fn intervals_must_be_known(mut cache: EntityCache) {
    let err = run(r#"{"locations": ["Q183"], "interval": "hourly"}"#, &mut cache)
        .expect_err("unknown interval");

    assert!(matches!(
        err,
        QueryError::Time(TimeError::UnknownInterval { .. })
    ));
}

#[rstest]
fn flat_locations_reject_depth(mut cache: EntityCache) {
    let time = TimeQuery::new(None, None, today()).expect("query");
    let err = QuerySession::new(&mut cache, Locations::Flat(vec![GERMANY]), 1, time)
        .expect_err("flat list with depth");

    assert!(matches!(err, QueryError::FlatDepth { depth: 1 }));
}

#[rstest]
fn unknown_request_fields_are_rejected() {
    let err = QueryRequest::from_json(r#"{"locations": ["Q183"], "colour": "red"}"#)
        .expect_err("unknown field");

    assert!(matches!(err, QueryError::Request { .. }));
}

#[rstest]
fn every_property_of_a_category_can_be_selected(mut cache: EntityCache) {
    let time = TimeQuery::new(None, None, today()).expect("query");
    let mut session =
        QuerySession::new(&mut cache, Locations::Flat(vec![GERMANY]), 0, time).expect("session");

    let table = session
        .query_category(
            &PropertyRegistry::standard(),
            Category::Misc,
            &PropertySelection::Every(true),
        )
        .expect("query succeeds")
        .expect("misc has properties");

    assert_eq!(table.columns(), ["location", "qid", "abbr", "sub_abbr"]);
    assert_eq!(table.cell(0, "abbr").ok(), Some(&Scalar::from("DE (no date)")));
}

#[rstest]
fn first_location_without_territories_still_yields_rows(mut cache: EntityCache) {
    let table = run(
        r#"{
            "locations": ["Q20", "Q183"],
            "depth": 2,
            "properties": {"misc": ["sub_country_abbr"]}
        }"#,
        &mut cache,
    )
    .expect("query succeeds");

    assert_eq!(
        table.columns(),
        ["location", "sub_lctn", "sub_sub_lctn", "qid", "sub_abbr"]
    );
    assert_eq!(texts(&table, "location"), ["Norway", "Germany", "Germany"]);
    assert_eq!(texts(&table, "sub_lctn"), ["nan", "Bavaria", "Saxony"]);
}
