//! Topic-page indirection.
//!
//! Wikidata often moves economic or geographic statements about a country to
//! a dedicated topic item ("economy of Germany"). When a location lacks a
//! property, the category's topic link is followed once before the location is
//! reported as lacking the data.

use log::warn;
use wikirepo_core::{EntityCache, EntityId, StoreError, TimeKey, TimeQuery};

use crate::{Category, extract::main_entity_ref};

/// Outcome of looking for a property on a location or its topic item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicResolution {
    /// Entity whose claims should be read.
    pub effective_id: EntityId,
    /// The location the caller asked about, when it differs from
    /// `effective_id`.
    pub original_id: Option<EntityId>,
    /// Slot for the placeholder value when the property is unavailable.
    pub placeholder: Option<TimeKey>,
}

impl TopicResolution {
    /// Whether extraction should be skipped in favour of the placeholder.
    #[must_use]
    pub const fn skip(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Identifier results are recorded under.
    #[must_use]
    pub fn output_id(&self) -> EntityId {
        self.original_id.unwrap_or(self.effective_id)
    }
}

/// Decide which entity supplies `property` for `entity_id`.
///
/// # Errors
///
/// Propagates failures fetching `entity_id`. A topic item that cannot be
/// fetched is treated as lacking the property.
pub fn resolve_topic(
    cache: &mut EntityCache,
    entity_id: EntityId,
    property: EntityId,
    category: Category,
    time: &TimeQuery,
) -> Result<TopicResolution, StoreError> {
    let entity = cache.get(entity_id)?;
    if entity.has_property(property) {
        return Ok(TopicResolution {
            effective_id: entity_id,
            original_id: None,
            placeholder: None,
        });
    }

    let topic = category
        .topic_property()
        .and_then(|link| main_entity_ref(&entity, link, 0));
    if let Some(topic_id) = topic
        && cache
            .get(topic_id)
            .is_ok_and(|topic_entity| topic_entity.has_property(property))
    {
        return Ok(TopicResolution {
            effective_id: topic_id,
            original_id: Some(entity_id),
            placeholder: None,
        });
    }

    report_unavailable(cache, entity_id, property, "");
    Ok(TopicResolution {
        effective_id: entity_id,
        original_id: None,
        placeholder: Some(time.fallback_key()),
    })
}

/// Log that `entity_id` lacks `property`.
pub(crate) fn report_unavailable(
    cache: &mut EntityCache,
    entity_id: EntityId,
    property: EntityId,
    purpose: &str,
) {
    let label = cache.describe(entity_id);
    let property_label = cache.describe(property);
    warn!(
        "{label} '{entity_id}' currently does not have the '{property_label}' property '{property}'{purpose}."
    );
}
