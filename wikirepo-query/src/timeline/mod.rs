//! Property values of each entity, indexed by time bucket.
//!
//! Two shapes exist. The single-value shape records one scalar per bucket and
//! joins colliding claims into a comma-separated string. The qualified shape
//! records, per bucket, a mapping from each claim's main value label to a
//! sub-value (a qualifier or a presence flag), which later fans out into one
//! column per label.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use log::debug;
use wikirepo_core::{
    Claim, Entity, EntityCache, EntityId, POINT_IN_TIME, Scalar, StoreError, TimeKey, TimeQuery,
};

use crate::{
    PropertySpec,
    extract::{extract_value, main_value},
    span::intersect,
    topic::resolve_topic,
};

/// Values of one entity keyed by bucket.
pub type Timeline<V> = BTreeMap<TimeKey, V>;

/// Labelled values recorded at one bucket for the qualified shape.
///
/// Labels keep first-seen order; recording a label again replaces its value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Qualified {
    entries: Vec<(String, Scalar)>,
}

impl Qualified {
    /// Record `value` under `label`.
    pub fn insert(&mut self, label: String, value: Scalar) {
        if let Some(slot) = self.entries.iter_mut().find(|(l, _)| *l == label) {
            slot.1 = value;
        } else {
            self.entries.push((label, value));
        }
    }

    /// Value recorded under `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Scalar> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, value)| value)
    }

    /// Labels and values in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v))
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Timelines for a batch of entities, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSet<V> {
    entries: Vec<(EntityId, Timeline<V>)>,
}

impl<V> Default for TimelineSet<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> TimelineSet<V> {
    /// Record `timeline` for `id`, replacing an earlier one in place.
    pub fn insert(&mut self, id: EntityId, timeline: Timeline<V>) {
        if let Some(slot) = self.entries.iter_mut().find(|(e, _)| *e == id) {
            slot.1 = timeline;
        } else {
            self.entries.push((id, timeline));
        }
    }

    /// Timeline recorded for `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Timeline<V>> {
        self.entries
            .iter()
            .find(|(e, _)| *e == id)
            .map(|(_, timeline)| timeline)
    }

    /// Entities and timelines in input order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Timeline<V>)> {
        self.entries.iter().map(|(id, timeline)| (*id, timeline))
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entity was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build single-value timelines of `spec` for `ids`.
///
/// Two claims landing in the same bucket are joined as `"a, b"` in claim
/// order.
///
/// # Errors
///
/// Propagates entity store failures.
pub fn build_value_timelines(
    cache: &mut EntityCache,
    ids: &[EntityId],
    spec: &PropertySpec,
    time: &TimeQuery,
) -> Result<TimelineSet<Scalar>, StoreError> {
    build(
        cache,
        ids,
        spec,
        time,
        || Scalar::Missing,
        |cache, entity, index, timeline, keys| {
            let value = extract_value(cache, entity, spec.property, index, spec.sub, spec.ignore)?;
            for key in keys {
                match timeline.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert(value.clone());
                    }
                    Entry::Occupied(mut slot) => {
                        let joined = format!("{}, {value}", slot.get());
                        slot.insert(Scalar::Text(joined));
                    }
                }
            }
            Ok(())
        },
    )
}

/// Build qualified timelines of `spec` for `ids`.
///
/// Each bucket maps the label of a claim's main value to the claim's
/// sub-value. A label recorded twice in one bucket keeps the later claim.
///
/// # Errors
///
/// Propagates entity store failures.
pub fn build_qualified_timelines(
    cache: &mut EntityCache,
    ids: &[EntityId],
    spec: &PropertySpec,
    time: &TimeQuery,
) -> Result<TimelineSet<Qualified>, StoreError> {
    build(
        cache,
        ids,
        spec,
        time,
        Qualified::default,
        |cache, entity, index, timeline, keys| {
            let label = main_value(cache, entity, spec.property, index, spec.ignore)?.to_string();
            let value = extract_value(cache, entity, spec.property, index, spec.sub, spec.ignore)?;
            for key in keys {
                timeline
                    .entry(key)
                    .or_default()
                    .insert(label.clone(), value.clone());
            }
            Ok(())
        },
    )
}

fn build<V>(
    cache: &mut EntityCache,
    ids: &[EntityId],
    spec: &PropertySpec,
    time: &TimeQuery,
    placeholder: impl Fn() -> V,
    mut record: impl FnMut(
        &mut EntityCache,
        &Entity,
        usize,
        &mut Timeline<V>,
        Vec<TimeKey>,
    ) -> Result<(), StoreError>,
) -> Result<TimelineSet<V>, StoreError> {
    let mut timelines = TimelineSet::default();
    for &id in ids {
        let resolution = resolve_topic(cache, id, spec.property, spec.category, time)?;
        let mut timeline = Timeline::new();
        if let Some(key) = resolution.placeholder.clone() {
            timeline.insert(key, placeholder());
        } else {
            let entity: Arc<Entity> = cache.get(resolution.effective_id)?;
            for (index, claim) in entity.claims(spec.property).iter().enumerate() {
                match claim_keys(claim, spec, time) {
                    Some(keys) => record(cache, entity.as_ref(), index, &mut timeline, keys)?,
                    None => debug!(
                        "claim {index} of {} on {} is outside the query window",
                        spec.property, resolution.effective_id
                    ),
                }
            }
        }
        timelines.insert(resolution.output_id(), timeline);
    }
    Ok(timelines)
}

/// Buckets a claim contributes to, `None` when it contributes nothing.
fn claim_keys(claim: &Claim, spec: &PropertySpec, time: &TimeQuery) -> Option<Vec<TimeKey>> {
    if spec.span {
        return intersect(claim, time);
    }
    let key = claim
        .qualifier_date(POINT_IN_TIME)
        .map_or_else(|| time.fallback_key(), |date| time.bucket(date));
    time.includes(&key).then(|| vec![key])
}
