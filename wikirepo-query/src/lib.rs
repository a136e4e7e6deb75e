//! Time-indexed property queries over Wikidata entities.
//!
//! Responsibilities:
//! - Read claim values and decide which time buckets they apply to.
//! - Expand locations into their contained territories.
//! - Assemble per-property tables and join them into one result.
//!
//! Boundaries:
//! - Entities come from an [`EntityCache`](wikirepo_core::EntityCache); no
//!   network or filesystem access happens here.
//! - Properties are declared in the [`PropertyRegistry`], not in code paths.
//!
//! Invariants:
//! - Input entity order and claim order are preserved in every output.
//! - Missing or malformed data becomes [`Scalar::Missing`](wikirepo_core::Scalar),
//!   never an error.
#![forbid(unsafe_code)]

mod error;
mod extract;
pub mod location;
mod query;
mod registry;
mod span;
pub mod table;
pub mod timeline;
mod topic;

pub use error::QueryError;
pub use extract::{SubProperty, extract_value, main_entity_ref, main_value};
pub use location::{
    LocationError, LocationNode, LocationTree, Locations, NodeId, SubLocationFilter,
    expand_locations,
};
pub use query::{PropertySelection, QueryRequest, QuerySession, query, query_at};
pub use registry::{Category, Output, PostProcess, PropertyRegistry, PropertySpec, RegistryError};
pub use span::intersect;
pub use table::{Table, TableError};
pub use topic::{TopicResolution, resolve_topic};
