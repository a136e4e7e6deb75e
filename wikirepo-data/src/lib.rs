//! Wikidata adapters for the wikirepo query engine.
//!
//! Responsibilities:
//! - Decode `Special:EntityData` documents into core [`Entity`](wikirepo_core::Entity) values.
//! - Fetch entities over HTTP ([`HttpEntityStore`]).
//! - Replay entities from a directory of saved documents ([`SnapshotEntityStore`]).
//!
//! Boundaries:
//! - Do not encode query rules (live in `wikirepo-query`).
//! - Keep blocking I/O off async executors; the HTTP store bridges to Tokio.
//!
//! Invariants:
//! - Claims and qualifier snaks keep document order.
//! - No global mutable state.
#![forbid(unsafe_code)]

mod document;
pub mod http;
pub mod snapshot;

pub use document::{DocumentError, parse_entity_document};
pub use http::{HttpEntityStore, HttpEntityStoreConfig, StoreBuildError};
pub use snapshot::{SnapshotEntityStore, SnapshotError};
