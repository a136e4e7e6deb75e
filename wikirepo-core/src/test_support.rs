//! In-memory [`EntityStore`] and snak constructors used by unit and behaviour
//! tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{DataValue, Entity, EntityId, EntityStore, Snak, StoreError};

/// In-memory store that counts fetches.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entities: HashMap<EntityId, Entity>,
    fetches: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Store containing `entities`; later duplicates replace earlier ones.
    pub fn with_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = Entity>,
    {
        Self {
            entities: entities.into_iter().map(|e| (e.id, e)).collect(),
            fetches: Arc::default(),
        }
    }

    /// Add or replace an entity.
    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    /// Handle observing how many fetches this store has served.
    #[must_use]
    pub fn fetch_counter(&self) -> FetchCounter {
        FetchCounter(Arc::clone(&self.fetches))
    }
}

impl EntityStore for MemoryStore {
    fn fetch(&self, id: EntityId) -> Result<Entity, StoreError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.entities
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }
}

/// Shared view of a [`MemoryStore`]'s fetch count.
#[derive(Debug, Clone)]
pub struct FetchCounter(Arc<AtomicUsize>);

impl FetchCounter {
    /// Fetches served so far.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Quantity snak with a dimensionless unit.
#[must_use]
pub fn quantity(amount: &str) -> Snak {
    Snak::new(DataValue::Quantity {
        amount: amount.to_owned(),
        unit: "1".to_owned(),
    })
}

/// Snak referencing item `Q{number}`.
#[must_use]
pub const fn item(number: u64) -> Snak {
    Snak::new(DataValue::EntityRef(EntityId::item(number)))
}

/// String literal snak.
#[must_use]
pub fn text(value: &str) -> Snak {
    Snak::new(DataValue::Text(value.to_owned()))
}

/// Time snak for a `YYYY-MM-DD` date, rendered as a Wikidata time literal.
#[must_use]
pub fn time(date: &str) -> Snak {
    Snak::new(DataValue::Time(format!("+{date}T00:00:00Z")))
}

/// Entity with an English label.
#[must_use]
pub fn labelled(id: EntityId, label: &str) -> Entity {
    Entity::new(id).with_label("en", label)
}
