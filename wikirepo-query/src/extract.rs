//! Turn claim snaks into scalars.
//!
//! Extraction never fails on malformed data: anything that cannot be read
//! becomes [`Scalar::Missing`]. Only store failures other than a missing
//! referenced entity are propagated.

use log::debug;
use wikirepo_core::{DataValue, Entity, EntityCache, EntityId, Scalar, Snak, StoreError};

/// Which part of a claim supplies the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubProperty {
    /// The claim's main value.
    #[default]
    Main,
    /// The first qualifier of the given property.
    Qualifier(EntityId),
    /// Only the claim's existence matters; the value is `true`.
    Presence,
}

/// Read the value of claim `index` of `property` on `entity`.
///
/// Entity references resolve to the referenced entity's label; quantities and
/// string literals are coerced to integer, float or text. `ignore` is removed
/// from the text before coercion.
///
/// # Errors
///
/// Returns a [`StoreError`] when resolving a referenced entity's label fails
/// for a reason other than the entity not existing.
pub fn extract_value(
    cache: &mut EntityCache,
    entity: &Entity,
    property: EntityId,
    index: usize,
    sub: SubProperty,
    ignore: &str,
) -> Result<Scalar, StoreError> {
    let claim = entity.claim(property, index);
    let snak = match sub {
        SubProperty::Presence => return Ok(Scalar::Bool(true)),
        SubProperty::Main => claim.map(|c| &c.main),
        SubProperty::Qualifier(qualifier) => claim.and_then(|c| c.qualifier(qualifier)),
    };
    snak.map_or(Ok(Scalar::Missing), |s| coerce_snak(cache, s, ignore))
}

/// Read the main value of claim `index`; shorthand for [`SubProperty::Main`].
///
/// # Errors
///
/// See [`extract_value`].
pub fn main_value(
    cache: &mut EntityCache,
    entity: &Entity,
    property: EntityId,
    index: usize,
    ignore: &str,
) -> Result<Scalar, StoreError> {
    extract_value(cache, entity, property, index, SubProperty::Main, ignore)
}

/// Entity referenced by the main value of claim `index`.
#[must_use]
pub fn main_entity_ref(entity: &Entity, property: EntityId, index: usize) -> Option<EntityId> {
    entity
        .claim(property, index)
        .and_then(|claim| claim.main.entity_ref())
}

fn coerce_snak(cache: &mut EntityCache, snak: &Snak, ignore: &str) -> Result<Scalar, StoreError> {
    match &snak.value {
        Some(DataValue::EntityRef(id)) => match cache.label(*id) {
            Ok(label) => Ok(label.map_or(Scalar::Missing, |l| Scalar::Text(strip(&l, ignore)))),
            Err(StoreError::NotFound { id: missing }) => {
                debug!("referenced entity {missing} does not exist");
                Ok(Scalar::Missing)
            }
            Err(err) => Err(err),
        },
        Some(DataValue::Quantity { amount, .. }) => Ok(Scalar::coerce(&strip(amount, ignore))),
        Some(DataValue::Text(text)) => Ok(Scalar::coerce(&strip(text, ignore))),
        Some(DataValue::Time(_) | DataValue::Unsupported) | None => Ok(Scalar::Missing),
    }
}

fn strip(text: &str, ignore: &str) -> String {
    if ignore.is_empty() {
        text.to_owned()
    } else {
        text.replace(ignore, "")
    }
}
