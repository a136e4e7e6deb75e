//! Abstraction over where entity documents come from.

use thiserror::Error;

use crate::{Entity, EntityId};

/// Errors raised by an [`EntityStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The store has no document for the entity.
    #[error("entity {id} was not found")]
    NotFound {
        /// Requested entity.
        id: EntityId,
    },
    /// The backing service or file could not be reached.
    #[error("failed to fetch entity {id}: {message}")]
    Transport {
        /// Requested entity.
        id: EntityId,
        /// Human-readable failure description.
        message: String,
    },
    /// The document was retrieved but could not be decoded.
    #[error("entity document for {id} is malformed: {message}")]
    Malformed {
        /// Requested entity.
        id: EntityId,
        /// Decoder failure description.
        message: String,
    },
}

/// Fetch entity documents by identifier.
///
/// Implementations are synchronous; network-backed stores bridge to their own
/// runtime internally.
///
/// # Examples
///
/// ```
/// use wikirepo_core::{Entity, EntityId, EntityStore, StoreError};
///
/// struct OnlyGermany;
///
/// impl EntityStore for OnlyGermany {
///     fn fetch(&self, id: EntityId) -> Result<Entity, StoreError> {
///         if id == EntityId::item(183) {
///             Ok(Entity::new(id).with_label("en", "Germany"))
///         } else {
///             Err(StoreError::NotFound { id })
///         }
///     }
/// }
///
/// assert!(OnlyGermany.fetch(EntityId::item(183)).is_ok());
/// assert!(OnlyGermany.fetch(EntityId::item(64)).is_err());
/// ```
pub trait EntityStore {
    /// Return the entity document for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown entities and other
    /// variants for transport or decoding failures.
    fn fetch(&self, id: EntityId) -> Result<Entity, StoreError>;
}

impl<S: EntityStore + ?Sized> EntityStore for &S {
    fn fetch(&self, id: EntityId) -> Result<Entity, StoreError> {
        (**self).fetch(id)
    }
}

impl<S: EntityStore + ?Sized> EntityStore for Box<S> {
    fn fetch(&self, id: EntityId) -> Result<Entity, StoreError> {
        (**self).fetch(id)
    }
}
