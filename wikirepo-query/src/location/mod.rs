//! Location hierarchies derived from containment claims.
//!
//! Locations are held in an arena: nodes refer to their parent and children by
//! [`NodeId`], so an entity appearing under two parents is simply two nodes.
//! A node whose children were looked up carries a (possibly empty) child list;
//! a node that was never expanded carries none. Depth is counted by those
//! child lists, or taken from the expansion that built the tree.

mod expand;
mod filter;

pub use expand::expand_locations;
pub use filter::SubLocationFilter;

use thiserror::Error;
use wikirepo_core::{EntityId, TimeKey};

/// Errors raised while combining or reading location trees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LocationError {
    /// Two trees of different depth cannot be merged.
    #[error("cannot merge location trees of depth {left} and {right}")]
    DepthMismatch {
        /// Depth of the receiving tree.
        left: usize,
        /// Depth of the merged-in tree.
        right: usize,
    },
}

/// Index of a node inside a [`LocationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A location in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationNode {
    /// Wikidata entity of the location.
    pub id: EntityId,
    /// Display label.
    pub label: String,
    /// Distance from the root (roots are depth 0).
    pub depth: usize,
    /// Parent node; `None` for roots.
    pub parent: Option<NodeId>,
    /// Buckets in which the containment claim holds; `None` for roots and
    /// for most-recent expansions.
    pub valid_buckets: Option<Vec<TimeKey>>,
    children: Option<Vec<NodeId>>,
}

impl LocationNode {
    /// Child nodes, `None` when the node was never expanded.
    #[must_use]
    pub fn children(&self) -> Option<&[NodeId]> {
        self.children.as_deref()
    }
}

/// Arena of location nodes reachable from ordered roots.
///
/// # Examples
///
/// ```
/// use wikirepo_core::EntityId;
/// use wikirepo_query::LocationTree;
///
/// let mut tree = LocationTree::default();
/// let germany = tree.add_root(EntityId::item(183), "Germany");
/// tree.add_child(germany, EntityId::item(980), "Bavaria", None);
///
/// assert_eq!(tree.derive_depth(), 1);
/// assert_eq!(tree.ids_at_depth(1), vec![EntityId::item(980)]);
/// assert_eq!(tree.labels(), vec!["Germany", "Bavaria"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationTree {
    nodes: Vec<LocationNode>,
    roots: Vec<NodeId>,
    expanded_to: Option<usize>,
}

impl LocationTree {
    /// Add a root, replacing an existing root for the same entity.
    pub fn add_root(&mut self, id: EntityId, label: impl Into<String>) -> NodeId {
        let node = self.push(LocationNode {
            id,
            label: label.into(),
            depth: 0,
            parent: None,
            valid_buckets: None,
            children: None,
        });
        self.set_root(id, node);
        node
    }

    /// Add a child under `parent`, marking the parent as expanded.
    ///
    /// A child for the same entity keeps its position and takes the new
    /// label and buckets.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        id: EntityId,
        label: impl Into<String>,
        valid_buckets: Option<Vec<TimeKey>>,
    ) -> NodeId {
        let label_text: String = label.into();
        let existing = self
            .child_ids(parent)
            .find(|&child| self.node(child).is_some_and(|n| n.id == id));
        if let Some(child) = existing
            && let Some(node) = self.nodes.get_mut(child.0)
        {
            node.label = label_text;
            node.valid_buckets = valid_buckets;
            return child;
        }

        let depth = self.node(parent).map_or(0, |p| p.depth.saturating_add(1));
        let child = self.push(LocationNode {
            id,
            label: label_text,
            depth,
            parent: Some(parent),
            valid_buckets,
            children: None,
        });
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.get_or_insert_with(Vec::new).push(child);
        }
        child
    }

    /// Record that `node` was expanded, even if it has no children.
    pub fn mark_expanded(&mut self, node: NodeId) {
        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.children.get_or_insert_with(Vec::new);
        }
    }

    /// Node by index.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&LocationNode> {
        self.nodes.get(node.0)
    }

    /// Roots in insertion order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Whether the tree has no roots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of expanded levels.
    ///
    /// This is the deepest child list reachable from any root, and never less
    /// than the depth the tree was expanded to, so roots or branches without
    /// territories do not make the tree shallower.
    #[must_use]
    pub fn derive_depth(&self) -> usize {
        let listed = self
            .walk()
            .into_iter()
            .filter_map(|id| self.node(id))
            .filter(|node| node.children.is_some())
            .map(|node| node.depth.saturating_add(1))
            .max()
            .unwrap_or(0);
        listed.max(self.expanded_to.unwrap_or(0))
    }

    /// Nodes in depth-first order.
    #[must_use]
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.child_ids(node).collect::<Vec<_>>().into_iter().rev());
        }
        order
    }

    /// Nodes at `depth` in depth-first order.
    #[must_use]
    pub fn nodes_at_depth(&self, depth: usize) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&id| self.node(id).is_some_and(|n| n.depth == depth))
            .collect()
    }

    /// Distinct entities at `depth` in depth-first order.
    #[must_use]
    pub fn ids_at_depth(&self, depth: usize) -> Vec<EntityId> {
        let mut ids = Vec::new();
        for node in self.nodes_at_depth(depth) {
            if let Some(entry) = self.node(node)
                && !ids.contains(&entry.id)
            {
                ids.push(entry.id);
            }
        }
        ids
    }

    /// Every label in depth-first order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.walk()
            .into_iter()
            .filter_map(|id| self.node(id))
            .map(|n| n.label.as_str())
            .collect()
    }

    /// Labels at `depth` in depth-first order.
    #[must_use]
    pub fn labels_at_depth(&self, depth: usize) -> Vec<&str> {
        self.nodes_at_depth(depth)
            .into_iter()
            .filter_map(|id| self.node(id))
            .map(|n| n.label.as_str())
            .collect()
    }

    /// Merge `other` into this tree.
    ///
    /// Roots of `other` replace roots for the same entity and are appended
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::DepthMismatch`] when the derived depths
    /// differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), LocationError> {
        let (left, right) = (self.derive_depth(), other.derive_depth());
        if left != right {
            return Err(LocationError::DepthMismatch { left, right });
        }
        self.expanded_to = self.expanded_to.max(other.expanded_to);
        for &root in &other.roots {
            if let Some(imported) = self.import(other, root, None) {
                let id = self.node(imported).map(|n| n.id);
                if let Some(id) = id {
                    self.set_root(id, imported);
                }
            }
        }
        Ok(())
    }

    fn import(&mut self, other: &Self, source: NodeId, parent: Option<NodeId>) -> Option<NodeId> {
        let original = other.node(source)?;
        let copied = self.push(LocationNode {
            parent,
            children: original.children.as_ref().map(|_| Vec::new()),
            ..original.clone()
        });
        for child in other.child_ids(source) {
            if let Some(imported) = self.import(other, child, Some(copied))
                && let Some(node) = self.nodes.get_mut(copied.0)
            {
                node.children.get_or_insert_with(Vec::new).push(imported);
            }
        }
        Some(copied)
    }

    fn set_root(&mut self, id: EntityId, node: NodeId) {
        let position = self
            .roots
            .iter()
            .position(|&root| self.node(root).is_some_and(|n| n.id == id));
        match position.and_then(|pos| self.roots.get_mut(pos)) {
            Some(slot) => *slot = node,
            None => self.roots.push(node),
        }
    }

    fn child_ids(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(node)
            .and_then(LocationNode::children)
            .unwrap_or(&[])
            .iter()
            .copied()
    }

    fn push(&mut self, node: LocationNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len().saturating_sub(1))
    }
}

/// Locations a query runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locations {
    /// Plain list of top-level locations; only depth 0 is available.
    Flat(Vec<EntityId>),
    /// Expanded hierarchy.
    Tree(LocationTree),
}

impl From<LocationTree> for Locations {
    fn from(tree: LocationTree) -> Self {
        Self::Tree(tree)
    }
}

impl From<Vec<EntityId>> for Locations {
    fn from(ids: Vec<EntityId>) -> Self {
        Self::Flat(ids)
    }
}
