//! Core domain types for wikirepo.
//!
//! Responsibilities:
//! - Identify Wikidata items and properties ([`EntityId`]).
//! - Model entities, claims and qualifiers ([`Entity`], [`Claim`], [`Snak`]).
//! - Build time axes and bucket dates ([`TimeQuery`], [`TimeAxis`]).
//! - Memoise entity lookups behind the [`EntityStore`] seam ([`EntityCache`]).
//!
//! Boundaries:
//! - No network or filesystem access; adapters live in `wikirepo-data`.
//! - No table logic; that lives in `wikirepo-query`.
//!
//! Invariants:
//! - Claims and qualifiers keep document order.
//! - An entity is fetched from its store at most once per cache.
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;
mod entity;
mod id;
mod scalar;
mod store;
pub mod time;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use cache::{DEFAULT_LANGUAGES, EntityCache};
pub use entity::{Claim, DataValue, Entity, Snak};
pub use id::{
    CONTAINS_TERRITORY, ECONOMY_OF_TOPIC, END_TIME, EntityId, GEOGRAPHY_OF_TOPIC, IdError, IdKind,
    POINT_IN_TIME, START_TIME, is_wd_id,
};
pub use scalar::{MISSING_TEXT, Scalar};
pub use store::{EntityStore, StoreError};
pub use time::{
    Interval, TimeAxis, TimeError, TimeKey, TimeQuery, Timespan, interval_column_name,
    parse_wikidata_time,
};
