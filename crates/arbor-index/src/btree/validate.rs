//! Full structural check of a tree.

use std::collections::HashSet;
use std::fmt::Debug;

use arbor_common::Result;

use super::arena::NodeId;
use super::consistency_fault;
use super::node::Node;
use super::tree::BPlusTree;

/// State gathered while walking the tree top-down.
#[derive(Default)]
struct Walk {
    visited: HashSet<NodeId>,
    /// Leaves in left-to-right order.
    leaves: Vec<NodeId>,
    leaf_depth: Option<usize>,
    entries: usize,
}

impl<K: Ord + Debug, V> BPlusTree<K, V> {
    /// Checks every structural invariant of the tree.
    ///
    /// Returns `InternalConsistency` describing the first violation found:
    /// node occupancy, key ordering, separator bounds, uniform leaf depth,
    /// the leaf chain, the entry count and arena bookkeeping.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.root else {
            if self.len != 0 || self.arena.live_count() != 0 {
                return Err(consistency_fault(format!(
                    "empty tree with len {} and {} live nodes",
                    self.len,
                    self.arena.live_count()
                )));
            }
            return Ok(());
        };

        let mut walk = Walk::default();
        self.check_subtree(root, 0, None, None, &mut walk)?;

        let mut chain = Vec::with_capacity(walk.leaves.len());
        let mut next = walk.leaves.first().copied();
        while let Some(id) = next {
            if chain.len() == walk.leaves.len() {
                return Err(consistency_fault("leaf chain is longer than the leaf level"));
            }
            chain.push(id);
            next = self.arena.leaf(id)?.successor();
        }
        if chain != walk.leaves {
            return Err(consistency_fault(format!(
                "leaf chain {chain:?} does not match leaf order {:?}",
                walk.leaves
            )));
        }

        if walk.entries != self.len {
            return Err(consistency_fault(format!(
                "tree holds {} entries but len is {}",
                walk.entries, self.len
            )));
        }
        if walk.visited.len() != self.arena.live_count() {
            return Err(consistency_fault(format!(
                "{} nodes reachable but {} live in the arena",
                walk.visited.len(),
                self.arena.live_count()
            )));
        }
        Ok(())
    }

    /// Runs [`BPlusTree::validate`] when the tree is configured to.
    pub(super) fn after_mutation(&self) -> Result<()> {
        if self.config.check_invariants {
            self.validate()
        } else {
            Ok(())
        }
    }

    /// Checks the subtree at `id`, whose keys must lie in `[lower, upper)`.
    fn check_subtree(
        &self,
        id: NodeId,
        depth: usize,
        lower: Option<&K>,
        upper: Option<&K>,
        walk: &mut Walk,
    ) -> Result<()> {
        if !walk.visited.insert(id) {
            return Err(consistency_fault(format!("node {id} is reachable twice")));
        }
        let node = self.arena.get(id)?;
        let is_root = self.root == Some(id);

        if node.degree() != self.degree() {
            return Err(consistency_fault(format!(
                "node {id} has degree {} in a tree of degree {}",
                node.degree(),
                self.degree()
            )));
        }
        let keys = node.keys();
        if keys.len() > self.degree() - 1 {
            return Err(consistency_fault(format!(
                "node {id} overflows with {} keys",
                keys.len()
            )));
        }
        if let Some(pair) = keys.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(consistency_fault(format!(
                "node {id} keys out of order: {:?} before {:?}",
                pair[0], pair[1]
            )));
        }
        if let (Some(lower), Some(first)) = (lower, keys.first()) {
            if first < lower {
                return Err(consistency_fault(format!(
                    "node {id} key {first:?} below separator {lower:?}"
                )));
            }
        }
        if let (Some(upper), Some(last)) = (upper, keys.last()) {
            if last >= upper {
                return Err(consistency_fault(format!(
                    "node {id} key {last:?} not below separator {upper:?}"
                )));
            }
        }

        match node {
            Node::Leaf(leaf) => {
                if leaf.values().len() != keys.len() {
                    return Err(consistency_fault(format!(
                        "leaf {id} has {} keys but {} values",
                        keys.len(),
                        leaf.values().len()
                    )));
                }
                if is_root && keys.is_empty() {
                    return Err(consistency_fault(format!("root leaf {id} is empty")));
                }
                if !is_root && leaf.is_under_utilized() {
                    return Err(consistency_fault(format!(
                        "leaf {id} is under-utilized with {} keys",
                        keys.len()
                    )));
                }
                match walk.leaf_depth {
                    Some(expected) if expected != depth => {
                        return Err(consistency_fault(format!(
                            "leaf {id} at depth {depth}, expected {expected}"
                        )));
                    }
                    _ => walk.leaf_depth = Some(depth),
                }
                walk.leaves.push(id);
                walk.entries += keys.len();
            }
            Node::Internal(internal) => {
                let children = internal.children();
                if children.len() != keys.len() + 1 {
                    return Err(consistency_fault(format!(
                        "internal node {id} has {} keys but {} children",
                        keys.len(),
                        children.len()
                    )));
                }
                if is_root && children.len() < 2 {
                    return Err(consistency_fault(format!("internal root {id} has one child")));
                }
                if !is_root && internal.is_under_utilized() {
                    return Err(consistency_fault(format!(
                        "internal node {id} is under-utilized with {} children",
                        children.len()
                    )));
                }
                for (i, &child) in children.iter().enumerate() {
                    let child_lower = if i == 0 { lower } else { keys.get(i - 1) };
                    let child_upper = if i == keys.len() { upper } else { keys.get(i) };
                    self.check_subtree(child, depth + 1, child_lower, child_upper, walk)?;
                }
            }
        }
        Ok(())
    }
}
