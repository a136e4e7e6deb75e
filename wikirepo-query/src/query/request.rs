//! Declarative query requests.

use std::collections::BTreeMap;

use serde::Deserialize;
use wikirepo_core::{EntityId, Interval, Timespan};

use crate::{Category, QueryError, location::SubLocationFilter};

/// Which properties of a category to query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PropertySelection {
    /// `true` selects every property of the category, `false` none.
    Every(bool),
    /// Properties selected by registry name.
    Named(Vec<String>),
}

impl Default for PropertySelection {
    fn default() -> Self {
        Self::Every(false)
    }
}

/// A complete query, deserialisable from JSON.
///
/// ```
/// use wikirepo_query::{Category, QueryRequest};
///
/// let request = QueryRequest::from_json(
///     r#"{
///         "locations": ["Q183"],
///         "interval": "yearly",
///         "timespan": {"range": {"start": "2009-01-01", "end": "2010-01-01"}},
///         "properties": {"demographic": ["population"]}
///     }"#,
/// )?;
/// assert_eq!(request.depth, 0);
/// assert!(request.properties.contains_key(&Category::Demographic));
/// # Ok::<(), wikirepo_query::QueryError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryRequest {
    /// Top-level locations.
    pub locations: Vec<EntityId>,
    /// Levels of contained territories to expand.
    #[serde(default)]
    pub depth: usize,
    /// Sub-location labels to keep (`~label` excludes).
    #[serde(default)]
    pub sub_locations: Vec<String>,
    /// Granularity name; absent for most-recent queries.
    #[serde(default)]
    pub interval: Option<String>,
    /// Time window; requires an interval.
    #[serde(default)]
    pub timespan: Option<Timespan>,
    /// Selected properties per category.
    #[serde(default)]
    pub properties: BTreeMap<Category, PropertySelection>,
}

impl QueryRequest {
    /// Parse a request from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Request`] for malformed documents.
    pub fn from_json(text: &str) -> Result<Self, QueryError> {
        serde_json::from_str(text).map_err(|source| QueryError::Request { source })
    }

    /// The parsed interval.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Time`] for an unknown granularity.
    pub fn interval(&self) -> Result<Option<Interval>, QueryError> {
        Ok(self.interval.as_deref().map(str::parse).transpose()?)
    }

    /// Filter built from [`QueryRequest::sub_locations`].
    #[must_use]
    pub fn filter(&self) -> SubLocationFilter {
        SubLocationFilter::from_entries(&self.sub_locations)
    }
}
