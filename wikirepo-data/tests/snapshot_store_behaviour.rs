//! Behavioural tests for [`SnapshotEntityStore`] backed queries.

use camino::Utf8Path;
use chrono::NaiveDate;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;
use wikirepo_core::{EntityCache, EntityId, Scalar, StoreError};
use wikirepo_data::SnapshotEntityStore;
use wikirepo_query::{PropertyRegistry, QueryRequest, Table, query_at};

type SnapshotCell = RefCell<Option<(TempDir, EntityCache)>>;
type LabelCell = RefCell<Option<Result<Option<String>, StoreError>>>;
type TableCell = RefCell<Option<Table>>;

const GERMANY_FIXTURE: &str = include_str!("fixtures/Q183.json");

#[fixture]
fn snapshot() -> SnapshotCell {
    RefCell::new(None)
}

#[fixture]
fn label() -> LabelCell {
    RefCell::new(None)
}

#[fixture]
fn table() -> TableCell {
    RefCell::new(None)
}

fn with_cache<T>(cell: &SnapshotCell, action: impl FnOnce(&mut EntityCache) -> T) -> T {
    let mut borrow = cell.borrow_mut();
    let (_, cache) = borrow.as_mut().expect("snapshot must be prepared");
    action(cache)
}

#[given("a snapshot holding Germany's document")]
fn germany_snapshot(#[from(snapshot)] cell: &SnapshotCell) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = Utf8Path::from_path(dir.path()).expect("UTF-8 temp dir");
    let store = SnapshotEntityStore::open(path).expect("open snapshot");
    store
        .write_document(EntityId::item(183), GERMANY_FIXTURE.as_bytes())
        .expect("write fixture");
    *cell.borrow_mut() = Some((dir, EntityCache::new(store)));
}

#[when("I look up the label of {id}")]
fn look_up(id: String, #[from(snapshot)] cell: &SnapshotCell, #[from(label)] result: &LabelCell) {
    let entity: EntityId = id.parse().expect("valid identifier");
    let outcome = with_cache(cell, |cache| cache.label(entity));
    *result.borrow_mut() = Some(outcome);
}

#[when("I query Germany's population from 2009 to 2010")]
fn query_population(#[from(snapshot)] cell: &SnapshotCell, #[from(table)] result: &TableCell) {
    let request = QueryRequest::from_json(
        r#"{"locations": ["Q183"], "interval": "yearly",
            "timespan": {"range": {"start": "2009-01-01", "end": "2010-01-01"}},
            "properties": {"demographic": ["population"]}}"#,
    )
    .expect("valid request");
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
    let outcome = with_cache(cell, |cache| {
        query_at(&request, cache, &PropertyRegistry::standard(), today)
    })
    .expect("query succeeds");
    *result.borrow_mut() = Some(outcome);
}

#[then("the label is Germany")]
fn label_is_germany(#[from(label)] cell: &LabelCell) {
    let borrow = cell.borrow();
    match borrow.as_ref() {
        Some(Ok(found)) => assert_eq!(found.as_deref(), Some("Germany")),
        Some(Err(err)) => panic!("expected a label: {err}"),
        None => panic!("lookup must run"),
    }
}

#[then("the lookup reports a missing entity")]
fn missing_entity(#[from(label)] cell: &LabelCell) {
    let borrow = cell.borrow();
    assert!(
        matches!(borrow.as_ref(), Some(Err(StoreError::NotFound { .. }))),
        "expected NotFound, got {borrow:?}"
    );
}

#[then("the population column reads 81802257 then 80523746")]
fn population_column(#[from(table)] cell: &TableCell) {
    let borrow = cell.borrow();
    let result = borrow.as_ref().expect("query must run");
    assert_eq!(
        result.column("population").expect("population column"),
        [&Scalar::Int(81_802_257), &Scalar::Int(80_523_746)]
    );
}

#[scenario(path = "tests/features/snapshot_store.feature", index = 0)]
fn saved_document(snapshot: SnapshotCell, label: LabelCell, table: TableCell) {
    let _ = (snapshot, label, table);
}

#[scenario(path = "tests/features/snapshot_store.feature", index = 1)]
fn unknown_entity(snapshot: SnapshotCell, label: LabelCell, table: TableCell) {
    let _ = (snapshot, label, table);
}

#[scenario(path = "tests/features/snapshot_store.feature", index = 2)]
fn snapshot_query(snapshot: SnapshotCell, label: LabelCell, table: TableCell) {
    let _ = (snapshot, label, table);
}
