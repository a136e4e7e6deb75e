//! Unit tests for table operations and assembly.

use super::post::{
    LocationSum, count_values, fill_by_location, interpolate_by_location, split_value_dates,
    sum_location_values, value_shares,
};
use super::*;
use chrono::NaiveDate;
use rstest::{fixture, rstest};
use wikirepo_core::test_support::{MemoryStore, labelled};
use wikirepo_core::{EntityCache, Interval, TimeKey, TimeQuery, Timespan};

use crate::location::{LocationTree, Locations};
use crate::timeline::{Qualified, Timeline, TimelineSet};

const GERMANY: EntityId = EntityId::item(183);
const FRANCE: EntityId = EntityId::item(142);
const BAVARIA: EntityId = EntityId::item(980);
const SAXONY: EntityId = EntityId::item(1202);

fn date(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).expect("valid date")
}

fn yearly(start: i32, end: i32) -> TimeQuery {
    TimeQuery::new(
        Some(Interval::Yearly),
        Some(Timespan::Range {
            start: date(start),
            end: date(end),
        }),
        date(2024),
    )
    .expect("windowed query")
}

fn most_recent() -> TimeQuery {
    TimeQuery::new(None, None, date(2024)).expect("query")
}

fn bucket(text: &str) -> TimeKey {
    TimeKey::Bucket(text.to_owned())
}

#[fixture]
fn cache() -> EntityCache {
    EntityCache::new(MemoryStore::with_entities([
        labelled(GERMANY, "Germany"),
        labelled(FRANCE, "France"),
    ]))
}

fn text_column(table: &Table, name: &str) -> Vec<String> {
    table
        .column(name)
        .expect("column exists")
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

const fn windowed() -> Assignment<'static> {
    Assignment {
        id_column: "qid",
        time_column: Some("year"),
        mode: AssignMode::All,
    }
}

#[rstest]
#[case(0, "location", "qid")]
#[case(1, "sub_lctn", "sub_qid")]
#[case(2, "sub_sub_lctn", "sub_sub_qid")]
fn columns_are_named_by_depth(#[case] depth: usize, #[case] location: &str, #[case] id: &str) {
    assert_eq!(location_column(depth), location);
    assert_eq!(id_column(depth), id);
}

#[rstest]
fn rows_must_match_the_width() {
    let mut table = Table::new(["a", "b"]);
    let err = table.push_row(vec![Scalar::Missing]).expect_err("short row");
    assert!(matches!(err, TableError::RowWidth { expected: 2, found: 1 }));
}

#[rstest]
fn columns_can_be_added_renamed_and_dropped() {
    let mut table = Table::new(["location"]);
    table.push_row(vec!["Germany".into()]).expect("row");
    table.add_column("population", &Scalar::Missing).expect("add");
    table.rename_column("population", "pop").expect("rename");
    assert_eq!(table.columns(), ["location", "pop"]);
    assert!(matches!(
        table.add_column("pop", &Scalar::Missing),
        Err(TableError::DuplicateColumn { .. })
    ));
    table.drop_column("location").expect("drop");
    assert_eq!(table.columns(), ["pop"]);
    assert_eq!(table.rows(), [vec![Scalar::Missing]]);
}

#[rstest]
fn values_are_replaced_and_filled() {
    let mut table = Table::new(["country"]);
    for value in ["Kingdom of the Netherlands", "France"] {
        table.push_row(vec![value.into()]).expect("row");
    }
    table.push_row(vec![Scalar::Missing]).expect("row");
    table
        .replace_values("country", &[("Kingdom of the Netherlands", "Netherlands")])
        .expect("replace");
    table.fill_missing("country", &Scalar::from("unknown")).expect("fill");
    assert_eq!(
        text_column(&table, "country"),
        vec!["Netherlands", "France", "unknown"]
    );
}

#[rstest]
fn inner_join_matches_keys_and_drops_duplicate_columns() {
    let mut left = Table::new(["location", "qid", "year", "population"]);
    left.push_row(vec!["Germany".into(), "Q183".into(), "2010".into(), Scalar::Int(81)])
        .expect("row");
    left.push_row(vec!["Germany".into(), "Q183".into(), "2009".into(), Scalar::Int(82)])
        .expect("row");
    let mut right = Table::new(["location", "qid", "year", "area_km2", "population"]);
    right
        .push_row(vec![
            "Germany".into(),
            "Q183".into(),
            "2010".into(),
            Scalar::Int(357_000),
            Scalar::Int(0),
        ])
        .expect("row");

    let joined = left
        .inner_join(&right, &["location", "qid", "year"])
        .expect("join");
    assert_eq!(
        joined.columns(),
        ["location", "qid", "year", "population", "area_km2"]
    );
    assert_eq!(joined.len(), 1);
    assert_eq!(joined.cell(0, "population").expect("cell"), &Scalar::Int(81));
    assert_eq!(
        joined.cell(0, "area_km2").expect("cell"),
        &Scalar::Int(357_000)
    );
}

#[rstest]
fn records_serialise_missing_as_null() {
    let mut table = Table::new(["location", "population"]);
    table
        .push_row(vec!["Germany".into(), Scalar::Missing])
        .expect("row");
    let json = table.to_json().expect("json");
    assert_eq!(json, r#"[{"location":"Germany","population":null}]"#);
}

#[rstest]
fn flat_skeleton_has_one_row_per_bucket(mut cache: EntityCache) {
    let table = base_table(
        &mut cache,
        &Locations::Flat(vec![GERMANY, FRANCE]),
        0,
        &yearly(2009, 2010),
        Some("population"),
    )
    .expect("skeleton");
    assert_eq!(table.columns(), ["location", "qid", "year", "population"]);
    assert_eq!(text_column(&table, "location"), vec!["Germany", "Germany", "France", "France"]);
    assert_eq!(text_column(&table, "year"), vec!["2010", "2009", "2010", "2009"]);
}

#[rstest]
fn most_recent_skeleton_has_no_time_column(mut cache: EntityCache) {
    let table = base_table(
        &mut cache,
        &Locations::Flat(vec![GERMANY]),
        0,
        &most_recent(),
        None,
    )
    .expect("skeleton");
    assert_eq!(table.columns(), ["location", "qid"]);
    assert_eq!(table.len(), 1);
}

#[rstest]
fn flat_locations_reject_depth(mut cache: EntityCache) {
    let err = base_table(
        &mut cache,
        &Locations::Flat(vec![GERMANY]),
        1,
        &most_recent(),
        None,
    )
    .expect_err("flat depth");
    assert!(matches!(err, TableError::FlatDepth { depth: 1 }));
}

fn germany_tree() -> LocationTree {
    let mut tree = LocationTree::default();
    let germany = tree.add_root(GERMANY, "Germany");
    tree.add_child(germany, BAVARIA, "Bavaria", None);
    tree.add_child(germany, SAXONY, "Saxony", Some(vec![bucket("2010")]));
    let france = tree.add_root(FRANCE, "France");
    tree.mark_expanded(france);
    tree
}

#[rstest]
fn tree_skeleton_uses_leaf_buckets(mut cache: EntityCache) {
    let table = base_table(
        &mut cache,
        &Locations::Tree(germany_tree()),
        1,
        &yearly(2009, 2010),
        Some("sub_abbr"),
    )
    .expect("skeleton");
    assert_eq!(
        table.columns(),
        ["location", "sub_lctn", "sub_qid", "year", "sub_abbr"]
    );
    assert_eq!(
        text_column(&table, "sub_lctn"),
        vec!["Bavaria", "Bavaria", "Saxony", "nan"]
    );
    assert_eq!(
        text_column(&table, "year"),
        vec!["2010", "2009", "2010", "nan"]
    );
    assert_eq!(table.cell(3, "sub_qid").expect("cell"), &Scalar::Missing);
}

#[rstest]
fn tree_depth_must_match(mut cache: EntityCache) {
    let err = base_table(
        &mut cache,
        &Locations::Tree(germany_tree()),
        2,
        &most_recent(),
        None,
    )
    .expect_err("depth mismatch");
    assert!(matches!(err, TableError::DepthMismatch { given: 2, derived: 1 }));
}

fn population_timelines() -> TimelineSet<Scalar> {
    let mut timelines = TimelineSet::default();
    timelines.insert(
        GERMANY,
        Timeline::from([
            (bucket("2009"), Scalar::Int(82)),
            (bucket("2010"), Scalar::Int(81)),
            (bucket("1990"), Scalar::Int(79)),
        ]),
    );
    timelines
}

#[rstest]
fn all_mode_matches_identifier_and_bucket(mut cache: EntityCache) {
    let mut table = base_table(
        &mut cache,
        &Locations::Flat(vec![GERMANY]),
        0,
        &yearly(2009, 2010),
        Some("population"),
    )
    .expect("skeleton");
    assign_column(
        &mut table,
        &windowed(),
        "population",
        &population_timelines(),
        false,
    )
    .expect("assign");
    assert_eq!(text_column(&table, "population"), vec!["81", "82"]);
}

#[rstest]
#[case(false, "81 (2010)")]
#[case(true, "81")]
fn most_recent_mode_annotates_non_span_values(
    mut cache: EntityCache,
    #[case] span: bool,
    #[case] expected: &str,
) {
    let mut table = base_table(
        &mut cache,
        &Locations::Flat(vec![GERMANY]),
        0,
        &most_recent(),
        Some("population"),
    )
    .expect("skeleton");
    let target = Assignment {
        id_column: "qid",
        time_column: None,
        mode: AssignMode::MostRecent,
    };
    assign_column(&mut table, &target, "population", &population_timelines(), span)
        .expect("assign");
    assert_eq!(text_column(&table, "population"), vec![expected]);
}

#[rstest]
fn most_recent_prefers_dated_entries_over_no_date() {
    let mut table = Table::new(["qid", "population"]);
    table
        .push_row(vec!["Q183".into(), Scalar::Missing])
        .expect("row");
    let mut timelines = TimelineSet::default();
    timelines.insert(
        GERMANY,
        Timeline::from([
            (TimeKey::NoDate, Scalar::Int(1)),
            (bucket("2001-01-01"), Scalar::Int(2)),
        ]),
    );
    let target = Assignment {
        id_column: "qid",
        time_column: None,
        mode: AssignMode::MostRecent,
    };
    assign_column(&mut table, &target, "population", &timelines, false).expect("assign");
    assert_eq!(text_column(&table, "population"), vec!["2 (2001-01-01)"]);
}

#[rstest]
fn missing_values_are_never_annotated() {
    let mut table = Table::new(["qid", "population"]);
    table
        .push_row(vec!["Q183".into(), Scalar::Missing])
        .expect("row");
    let mut timelines = TimelineSet::default();
    timelines.insert(GERMANY, Timeline::from([(TimeKey::NoDate, Scalar::Missing)]));
    let target = Assignment {
        id_column: "qid",
        time_column: None,
        mode: AssignMode::MostRecent,
    };
    assign_column(&mut table, &target, "population", &timelines, false).expect("assign");
    assert_eq!(table.cell(0, "population").expect("cell"), &Scalar::Missing);
}

fn memberships(labels: &[(&str, bool)]) -> Qualified {
    let mut qualified = Qualified::default();
    for &(label, flag) in labels {
        qualified.insert(label.to_owned(), Scalar::Bool(flag));
    }
    qualified
}

#[rstest]
fn prefixed_columns_are_created_in_encounter_order(mut cache: EntityCache) {
    let mut table = base_table(
        &mut cache,
        &Locations::Flat(vec![GERMANY]),
        0,
        &yearly(2009, 2010),
        None,
    )
    .expect("skeleton");
    let mut timelines = TimelineSet::default();
    timelines.insert(
        GERMANY,
        Timeline::from([
            (bucket("2010"), memberships(&[("European Union", true)])),
            (bucket("2009"), memberships(&[("United Nations", true)])),
        ]),
    );
    assign_prefixed_columns(
        &mut table,
        &windowed(),
        "mem",
        &timelines,
        true,
    )
    .expect("assign");
    assert_eq!(
        table.columns(),
        ["location", "qid", "year", "mem_united_nations", "mem_european_union"]
    );
    assert_eq!(text_column(&table, "mem_european_union"), vec!["true", "nan"]);
    assert_eq!(text_column(&table, "mem_united_nations"), vec!["nan", "true"]);
}

#[rstest]
fn cleanup_normalises_nan_text_and_renames_the_id_column() {
    let mut table = Table::new(["location", "sub_lctn", "sub_qid", "sub_abbr"]);
    table
        .push_row(vec![
            "Germany".into(),
            "Bavaria".into(),
            "Q980".into(),
            "nan".into(),
        ])
        .expect("row");
    cleanup(&mut table, "sub_qid").expect("cleanup");
    assert_eq!(table.columns(), ["location", "sub_lctn", "qid", "sub_abbr"]);
    assert_eq!(table.cell(0, "sub_abbr").expect("cell"), &Scalar::Missing);
}

#[rstest]
fn value_dates_split_into_their_own_column() {
    let mut table = Table::new(["population", "area_km2"]);
    table
        .push_row(vec!["81 (2010)".into(), Scalar::Int(357_000)])
        .expect("row");
    table
        .push_row(vec![Scalar::Missing, Scalar::Int(1)])
        .expect("row");
    split_value_dates(&mut table, "population").expect("split");
    assert_eq!(table.columns(), ["population", "population_date", "area_km2"]);
    assert_eq!(table.cell(0, "population").expect("cell"), &Scalar::Int(81));
    assert_eq!(text_column(&table, "population_date"), vec!["2010", "nan"]);
}

fn regional() -> Table {
    let mut table = Table::new(["location", "year", "population"]);
    for (place, year, value) in [
        ("Denmark", "2010", 5),
        ("Greenland", "2010", 1),
        ("Denmark", "2011", 6),
        ("Greenland", "2011", 2),
    ] {
        table
            .push_row(vec![place.into(), year.into(), Scalar::Int(value)])
            .expect("row");
    }
    table
}

#[rstest]
#[case(false, vec!["6", "8"])]
#[case(true, vec!["4", "4"])]
fn location_values_combine_per_bucket(#[case] subtract: bool, #[case] expected: Vec<&str>) {
    let mut table = regional();
    let sum = LocationSum {
        target: "Denmark",
        source: "Greenland",
        location_column: "location",
        time_column: Some("year"),
        value_column: "population",
        subtract,
        drop_source: true,
    };
    sum_location_values(&mut table, &sum).expect("sum");
    assert_eq!(text_column(&table, "population"), expected);
    assert_eq!(text_column(&table, "location"), vec!["Denmark", "Denmark"]);
}

#[rstest]
fn locations_are_filled_from_their_first_value() {
    let mut table = Table::new(["location", "area_km2"]);
    for (place, value) in [
        ("Germany", Scalar::Missing),
        ("Germany", Scalar::Int(357_000)),
        ("France", Scalar::Missing),
    ] {
        table.push_row(vec![place.into(), value]).expect("row");
    }
    fill_by_location(&mut table, "location", "area_km2").expect("fill");
    assert_eq!(
        text_column(&table, "area_km2"),
        vec!["357000", "357000", "nan"]
    );
}

#[rstest]
fn numeric_gaps_are_interpolated_per_location() {
    let mut table = Table::new(["location", "population"]);
    for (place, value) in [
        ("Germany", Scalar::Int(10)),
        ("France", Scalar::Missing),
        ("Germany", Scalar::Missing),
        ("France", Scalar::Int(2)),
        ("Germany", Scalar::Missing),
        ("France", Scalar::from("n/a")),
        ("Germany", Scalar::Int(40)),
        ("France", Scalar::Missing),
        ("Germany", Scalar::Missing),
        ("France", Scalar::Int(8)),
    ] {
        table.push_row(vec![place.into(), value]).expect("row");
    }

    interpolate_by_location(&mut table, "location", "population").expect("interpolate");

    let germany: Vec<String> = table
        .rows_where(0, &Scalar::from("Germany"))
        .into_iter()
        .map(|row| table.cell(row, "population").expect("cell").to_string())
        .collect();
    let france: Vec<String> = table
        .rows_where(0, &Scalar::from("France"))
        .into_iter()
        .map(|row| table.cell(row, "population").expect("cell").to_string())
        .collect();
    assert_eq!(germany, vec!["10", "20", "30", "40", "40"]);
    assert_eq!(france, vec!["nan", "2", "n/a", "6", "8"]);
}

#[rstest]
fn counts_and_shares_are_sorted_by_value() {
    let mut table = Table::new(["fh_category"]);
    for value in ["partly free", "free", "free", "not free"] {
        table.push_row(vec![value.into()]).expect("row");
    }
    table.push_row(vec![Scalar::Missing]).expect("row");
    let counts = count_values(&table, "fh_category").expect("counts");
    assert_eq!(
        counts,
        vec![
            (Scalar::from("free"), 2),
            (Scalar::from("not free"), 1),
            (Scalar::from("partly free"), 1),
        ]
    );
    let shares = value_shares(&table, "fh_category").expect("shares");
    assert_eq!(shares.first(), Some(&(Scalar::from("free"), 0.4)));
}
