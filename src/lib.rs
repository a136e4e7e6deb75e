//! Facade crate for wikirepo.
//!
//! Wikirepo turns time-indexed Wikidata statements into tables keyed by
//! location and date. This crate re-exports the core data model and the
//! query engine, and exposes the Wikidata-backed entity stores behind the
//! `wikidata-http` feature.
//!
//! ```
//! use wikirepo::{
//!     Claim, DataValue, Entity, EntityCache, EntityId, EntityStore, QueryRequest, Scalar, Snak,
//!     StoreError, query,
//! };
//!
//! struct OneCountry;
//!
//! impl EntityStore for OneCountry {
//!     fn fetch(&self, id: EntityId) -> Result<Entity, StoreError> {
//!         if id != EntityId::item(183) {
//!             return Err(StoreError::NotFound { id });
//!         }
//!         let abbr = Claim::new(Snak::new(DataValue::Text("DE".to_owned())));
//!         Ok(Entity::new(id)
//!             .with_label("en", "Germany")
//!             .with_claim(EntityId::property(297), abbr))
//!     }
//! }
//!
//! let mut cache = EntityCache::new(OneCountry);
//! let request = QueryRequest::from_json(
//!     r#"{"locations": ["Q183"], "properties": {"misc": ["country_abbr"]}}"#,
//! )?;
//!
//! let table = query(&request, &mut cache)?;
//! assert_eq!(table.cell(0, "abbr")?, &Scalar::from("DE (no date)"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

pub use wikirepo_core::{
    Claim, DataValue, Entity, EntityCache, EntityId, EntityStore, Interval, Scalar, Snak,
    StoreError, TimeError, TimeKey, Timespan,
};

#[cfg(feature = "test-support")]
pub use wikirepo_core::test_support;

pub use wikirepo_query::{
    Category, LocationTree, Locations, PropertyRegistry, PropertySelection, PropertySpec,
    QueryError, QueryRequest, QuerySession, SubLocationFilter, Table, TableError, query, query_at,
};

#[cfg(feature = "wikidata-http")]
pub use wikirepo_data::{
    HttpEntityStore, HttpEntityStoreConfig, SnapshotEntityStore, SnapshotError, StoreBuildError,
};
