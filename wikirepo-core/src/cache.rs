//! Memoised entity lookup.
//!
//! Every entity is fetched at most once per cache. The cache has no
//! invalidation; callers keep it alive across queries to reuse documents.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::{Entity, EntityId, EntityStore, StoreError};

/// Label languages tried in order when none are configured.
pub const DEFAULT_LANGUAGES: [&str; 2] = ["en", "de"];

/// Entities fetched so far, keyed by identifier.
///
/// # Examples
///
/// ```
/// use wikirepo_core::{Entity, EntityCache, EntityId, EntityStore, StoreError};
///
/// struct Single;
///
/// impl EntityStore for Single {
///     fn fetch(&self, id: EntityId) -> Result<Entity, StoreError> {
///         Ok(Entity::new(id).with_label("de", "Deutschland"))
///     }
/// }
///
/// let mut cache = EntityCache::new(Single);
/// let germany = EntityId::item(183);
/// assert!(!cache.contains(germany));
/// assert_eq!(cache.label(germany)?.as_deref(), Some("Deutschland"));
/// assert!(cache.contains(germany));
/// # Ok::<(), StoreError>(())
/// ```
pub struct EntityCache {
    store: Box<dyn EntityStore>,
    entities: HashMap<EntityId, Arc<Entity>>,
    languages: Vec<String>,
}

impl fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCache")
            .field("store", &"<dyn EntityStore>")
            .field("entities", &self.entities.len())
            .field("languages", &self.languages)
            .finish()
    }
}

impl EntityCache {
    /// Empty cache backed by `store`.
    pub fn new(store: impl EntityStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            entities: HashMap::new(),
            languages: DEFAULT_LANGUAGES.iter().map(|&lang| lang.to_owned()).collect(),
        }
    }

    /// Replace the label language preference list.
    #[must_use]
    pub fn with_languages<I, L>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Label languages in preference order.
    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Return the entity, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the store's [`StoreError`]; failed lookups are not cached.
    pub fn get(&mut self, id: EntityId) -> Result<Arc<Entity>, StoreError> {
        if let Some(entity) = self.entities.get(&id) {
            return Ok(Arc::clone(entity));
        }
        debug!("fetching entity {id}");
        let entity = Arc::new(self.store.fetch(id)?);
        self.entities.insert(id, Arc::clone(&entity));
        Ok(entity)
    }

    /// Whether `id` has already been fetched.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Seed the cache with an entity, returning any document it replaces.
    pub fn insert(&mut self, entity: Entity) -> Option<Arc<Entity>> {
        self.entities.insert(entity.id, Arc::new(entity))
    }

    /// Preferred label of `id`, fetching the entity if needed.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`EntityCache::get`].
    pub fn label(&mut self, id: EntityId) -> Result<Option<String>, StoreError> {
        let entity = self.get(id)?;
        Ok(entity.label(&self.languages).map(str::to_owned))
    }

    /// Label for diagnostics: the preferred label, or the identifier when the
    /// entity cannot be fetched or has no label.
    pub fn describe(&mut self, id: EntityId) -> String {
        match self.label(id) {
            Ok(Some(label)) => label,
            Ok(None) | Err(_) => id.to_string(),
        }
    }

    /// Labels of every cached entity that has one.
    #[must_use]
    pub fn labels(&self) -> BTreeMap<EntityId, String> {
        self.entities
            .iter()
            .filter_map(|(id, entity)| {
                entity
                    .label(&self.languages)
                    .map(|label| (*id, label.to_owned()))
            })
            .collect()
    }

    /// Identifiers of cached entities in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of cached entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
