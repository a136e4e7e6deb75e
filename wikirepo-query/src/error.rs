//! Errors surfaced by query orchestration.

use thiserror::Error;
use wikirepo_core::{StoreError, TimeError};

use crate::{LocationError, RegistryError, table::TableError};

/// Errors raised while running a query.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueryError {
    /// The time window or interval is invalid.
    #[error(transparent)]
    Time(#[from] TimeError),
    /// A property or category name is not registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Location trees could not be merged.
    #[error(transparent)]
    Location(#[from] LocationError),
    /// A flat location list was combined with a non-zero depth.
    #[error("a flat location list only supports depth 0, got depth {depth}")]
    FlatDepth {
        /// Requested depth.
        depth: usize,
    },
    /// Expanding sub-locations failed.
    #[error("failed to expand sub-locations: {source}")]
    Expansion {
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// Reading a property from the entity store failed.
    #[error("failed to query '{property}': {source}")]
    Store {
        /// Registry name of the property.
        property: &'static str,
        /// Store failure naming the entity.
        #[source]
        source: StoreError,
    },
    /// Assembling the property's table failed.
    #[error("failed to assemble the '{property}' table: {source}")]
    Table {
        /// Registry name of the property.
        property: &'static str,
        /// Table failure.
        #[source]
        source: TableError,
    },
    /// Joining per-property tables failed.
    #[error("failed to join query results: {source}")]
    Join {
        /// Table failure.
        #[source]
        source: TableError,
    },
    /// A query request document could not be parsed.
    #[error("failed to parse query request: {source}")]
    Request {
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
}
