//! Depth-bounded expansion along containment claims.

use log::debug;
use wikirepo_core::{CONTAINS_TERRITORY, EntityCache, EntityId, StoreError, TimeQuery};

use super::{LocationTree, NodeId, SubLocationFilter};
use crate::{span::intersect, topic::report_unavailable};

/// Expand `roots` into a tree `depth` levels deep.
///
/// Level `k + 1` holds the administrative territories contained by each node
/// at level `k` that pass `filter`. In most-recent mode a containment claim
/// counts while it has no end time; in windowed mode it counts while its
/// span meets the window, and the buckets it covers are kept on the child.
/// Claims whose start or end date cannot be read are skipped in both modes.
///
/// # Errors
///
/// Propagates entity store failures. A contained territory that no longer
/// exists is skipped.
pub fn expand_locations(
    cache: &mut EntityCache,
    roots: &[EntityId],
    depth: usize,
    filter: &SubLocationFilter,
    time: &TimeQuery,
) -> Result<LocationTree, StoreError> {
    let mut tree = LocationTree::default();
    for &root in roots {
        let label = cache.label(root)?.unwrap_or_else(|| root.to_string());
        tree.add_root(root, label);
    }

    for level in 0..depth {
        for node in tree.nodes_at_depth(level) {
            expand_node(cache, &mut tree, node, filter, time)?;
        }
    }
    tree.expanded_to = Some(depth);
    Ok(tree)
}

fn expand_node(
    cache: &mut EntityCache,
    tree: &mut LocationTree,
    node: NodeId,
    filter: &SubLocationFilter,
    time: &TimeQuery,
) -> Result<(), StoreError> {
    let Some(id) = tree.node(node).map(|n| n.id) else {
        return Ok(());
    };
    tree.mark_expanded(node);

    let entity = cache.get(id)?;
    if !entity.has_property(CONTAINS_TERRITORY) {
        report_unavailable(cache, id, CONTAINS_TERRITORY, " to derive sub_lctns");
        return Ok(());
    }

    for claim in entity.claims(CONTAINS_TERRITORY) {
        let Some(child) = claim.main.entity_ref() else {
            continue;
        };
        let Some(buckets) = intersect(claim, time) else {
            continue;
        };
        let valid_buckets = (!time.is_most_recent()).then_some(buckets);
        let Some(label) = label_of(cache, child)? else {
            continue;
        };
        if filter.allows(&label) {
            tree.add_child(node, child, label, valid_buckets);
        }
    }
    Ok(())
}

/// Label of a contained territory, falling back to its identifier; `None`
/// when the entity does not exist.
fn label_of(cache: &mut EntityCache, id: EntityId) -> Result<Option<String>, StoreError> {
    match cache.label(id) {
        Ok(label) => Ok(Some(label.unwrap_or_else(|| id.to_string()))),
        Err(StoreError::NotFound { .. }) => {
            debug!("skipping location {id}: entity not found");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
