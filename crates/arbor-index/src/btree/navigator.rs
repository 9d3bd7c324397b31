//! Root-to-leaf descent and the per-operation parent map.

use std::collections::HashMap;

use arbor_common::Result;
use tracing::trace;

use super::arena::{NodeArena, NodeId};
use super::consistency_fault;
use super::node::Node;

/// Child to parent relation recorded during one descent.
///
/// Only valid for the operation that built it. Splits and merges move
/// children between nodes without updating the map, so it may only be
/// consulted upward along the recorded path.
#[derive(Debug, Default)]
pub struct ParentMap {
    parents: HashMap<NodeId, NodeId>,
}

impl ParentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `parent` as the parent of `child`.
    #[inline]
    pub fn record(&mut self, child: NodeId, parent: NodeId) {
        self.parents.insert(child, parent);
    }

    /// Parent of a node on the recorded path, or None for the root.
    #[inline]
    pub fn get(&self, child: NodeId) -> Option<NodeId> {
        self.parents.get(&child).copied()
    }

    /// Parent of a non-root node. Missing entries are a consistency fault.
    pub fn parent_of(&self, child: NodeId) -> Result<NodeId> {
        self.get(child)
            .ok_or_else(|| consistency_fault(format!("no parent recorded for node {child}")))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.parents.len()
    }
}

/// Descends from `start` to the leaf responsible for `key`.
///
/// When `parents` is given, every step records child -> parent in it.
pub fn find_leaf<K: Ord, V>(
    arena: &NodeArena<K, V>,
    start: NodeId,
    key: &K,
    mut parents: Option<&mut ParentMap>,
) -> Result<NodeId> {
    let mut current = start;
    let mut depth = 0usize;
    loop {
        match arena.get(current)? {
            Node::Leaf(_) => {
                trace!(leaf = %current, depth, "descent reached leaf");
                return Ok(current);
            }
            Node::Internal(internal) => {
                let child = internal.child_for(key);
                if let Some(map) = parents.as_deref_mut() {
                    map.record(child, current);
                }
                current = child;
                depth += 1;
            }
        }
    }
}
