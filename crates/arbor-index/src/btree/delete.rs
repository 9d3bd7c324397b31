//! Deletion with merge and redistribution.
//!
//! After a removal leaves a non-root node under-utilized, siblings are tried
//! in a fixed order: merge into the left sibling, merge the right sibling in,
//! borrow from the left, borrow from the right. A merge removes a separator
//! from the parent, which can cascade up to the root. A root left with a
//! single child is replaced by that child.

use std::fmt::Debug;

use arbor_common::{ArborError, Result};
use tracing::debug;

use super::arena::NodeId;
use super::consistency_fault;
use super::navigator::{find_leaf, ParentMap};
use super::node::Node;
use super::tree::BPlusTree;

impl<K: Ord + Clone + Debug, V> BPlusTree<K, V> {
    /// Removes `key` and returns its value.
    ///
    /// Fails with `KeyNotFound` and leaves the tree untouched when the key is
    /// absent.
    pub fn delete(&mut self, key: &K) -> Result<V> {
        let root = self.root.ok_or_else(|| ArborError::key_not_found(key))?;

        let mut parents = ParentMap::new();
        let leaf_id = find_leaf(&self.arena, root, key, Some(&mut parents))?;
        let value = self
            .arena
            .leaf_mut(leaf_id)?
            .remove(key)
            .ok_or_else(|| ArborError::key_not_found(key))?;
        self.len -= 1;

        self.rebalance(leaf_id, &parents)?;
        self.after_mutation()?;
        Ok(value)
    }

    /// Restores occupancy of `id` after one entry was removed from it.
    fn rebalance(&mut self, id: NodeId, parents: &ParentMap) -> Result<()> {
        if self.root == Some(id) {
            return self.shrink_root(id);
        }
        if !self.arena.get(id)?.is_under_utilized() {
            return Ok(());
        }

        let parent_id = parents.parent_of(id)?;
        let parent = self.arena.internal(parent_id)?;
        let i = parent.index_of(id).ok_or_else(|| {
            consistency_fault(format!("node {id} is not a child of {parent_id}"))
        })?;
        let left = i.checked_sub(1).and_then(|j| parent.child(j));
        let right = parent.child(i + 1);

        if let Some(left) = left {
            if self.arena.get(left)?.mergeable(self.arena.get(id)?) {
                let separator = self.separator(parent_id, i - 1)?;
                self.merge(left, separator.clone(), id)?;
                return self.delete_separator(parent_id, &separator, parents);
            }
        }
        if let Some(right) = right {
            if self.arena.get(id)?.mergeable(self.arena.get(right)?) {
                let separator = self.separator(parent_id, i)?;
                self.merge(id, separator.clone(), right)?;
                return self.delete_separator(parent_id, &separator, parents);
            }
        }
        match (left, right) {
            (Some(left), _) => self.redistribute_from_left(left, id, parent_id),
            (None, Some(right)) => self.redistribute_from_right(id, right, parent_id),
            (None, None) => Err(consistency_fault(format!(
                "non-root node {id} has no siblings"
            ))),
        }
    }

    /// Collapses a root that lost its last key.
    fn shrink_root(&mut self, root: NodeId) -> Result<()> {
        let node = self.arena.get(root)?;
        if node.key_count() > 0 {
            return Ok(());
        }
        let replacement = match node {
            Node::Leaf(_) => None,
            Node::Internal(internal) => Some(internal.child(0).ok_or_else(|| {
                consistency_fault(format!("internal root {root} has no children"))
            })?),
        };
        self.arena.release(root)?;
        self.root = replacement;
        match replacement {
            Some(child) => debug!(old_root = %root, new_root = %child, "collapsed root"),
            None => debug!(old_root = %root, "tree emptied"),
        }
        Ok(())
    }

    fn separator(&self, parent: NodeId, i: usize) -> Result<K> {
        self.arena
            .internal(parent)?
            .key(i)
            .cloned()
            .ok_or_else(|| consistency_fault(format!("node {parent} has no separator {i}")))
    }

    /// Removes a separator and the child after it from an internal node, then
    /// rebalances that node.
    fn delete_separator(&mut self, id: NodeId, separator: &K, parents: &ParentMap) -> Result<()> {
        self.arena
            .internal_mut(id)?
            .remove(separator)
            .ok_or_else(|| {
                consistency_fault(format!("separator {separator:?} missing from node {id}"))
            })?;
        self.rebalance(id, parents)
    }

    /// Merges `right` into its left sibling `left` and releases `right`.
    ///
    /// For internal nodes `separator` is pulled down between the two halves;
    /// leaves drop it and take over the right leaf's successor instead.
    fn merge(&mut self, left: NodeId, separator: K, right: NodeId) -> Result<()> {
        if self.arena.get(left)?.is_leaf() != self.arena.get(right)?.is_leaf() {
            return Err(consistency_fault(format!(
                "cannot merge nodes {left} and {right} of different kinds"
            )));
        }
        match self.arena.release(right)? {
            Node::Leaf(from) => self.arena.leaf_mut(left)?.merge_from(from),
            Node::Internal(from) => self.arena.internal_mut(left)?.merge_from(separator, from),
        }
        debug!(left = %left, right = %right, "merged nodes");
        Ok(())
    }

    /// Moves the last entry of `left` into its right sibling `id`.
    fn redistribute_from_left(&mut self, left: NodeId, id: NodeId, parent: NodeId) -> Result<()> {
        if self.arena.get(id)?.is_leaf() {
            let (key, value) = self
                .arena
                .leaf_mut(left)?
                .pop_last()
                .ok_or_else(|| consistency_fault(format!("leaf {left} is empty")))?;
            let separator = key.clone();
            self.arena.leaf_mut(id)?.push_front(key, value);
            self.arena
                .internal_mut(parent)?
                .change_key(left, id, separator)?;
        } else {
            let (key, child) = self
                .arena
                .internal_mut(left)?
                .pop_last()
                .ok_or_else(|| consistency_fault(format!("node {left} has no keys")))?;
            let old = self.arena.internal_mut(parent)?.change_key(left, id, key)?;
            self.arena.internal_mut(id)?.push_front(old, child);
        }
        debug!(from = %left, to = %id, "redistributed from left sibling");
        Ok(())
    }

    /// Moves the first entry of `right` into its left sibling `id`.
    fn redistribute_from_right(
        &mut self,
        id: NodeId,
        right: NodeId,
        parent: NodeId,
    ) -> Result<()> {
        if self.arena.get(id)?.is_leaf() {
            let sibling = self.arena.leaf_mut(right)?;
            let (key, value) = sibling
                .pop_first()
                .ok_or_else(|| consistency_fault(format!("leaf {right} is empty")))?;
            let separator = sibling.first_key().cloned().ok_or_else(|| {
                consistency_fault(format!("leaf {right} emptied by redistribution"))
            })?;
            self.arena.leaf_mut(id)?.push_back(key, value);
            self.arena
                .internal_mut(parent)?
                .change_key(id, right, separator)?;
        } else {
            let (key, child) = self
                .arena
                .internal_mut(right)?
                .pop_first()
                .ok_or_else(|| consistency_fault(format!("node {right} has no keys")))?;
            let old = self.arena.internal_mut(parent)?.change_key(id, right, key)?;
            self.arena.internal_mut(id)?.push_back(old, child);
        }
        debug!(from = %right, to = %id, "redistributed from right sibling");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(degree: usize, keys: &[u32]) -> BPlusTree<u32, u32> {
        let mut tree = BPlusTree::new(degree).unwrap();
        for &k in keys {
            tree.insert(k, k * 10).unwrap();
        }
        tree
    }

    fn leaf_keys(tree: &BPlusTree<u32, u32>) -> Vec<Vec<u32>> {
        let mut out = Vec::new();
        let mut leaf = tree.first_leaf();
        while let Some(id) = leaf {
            out.push(tree.node(id).unwrap().keys().to_vec());
            leaf = tree.successor(id);
        }
        out
    }

    #[test]
    fn test_delete_returns_value() {
        let mut tree = tree_with(4, &[1, 2, 3]);
        assert_eq!(tree.delete(&2).unwrap(), 20);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(&2), None);
    }

    #[test]
    fn test_delete_missing_key() {
        let mut empty = tree_with(3, &[]);
        assert!(matches!(empty.delete(&1), Err(ArborError::KeyNotFound { .. })));

        let mut tree = tree_with(3, &[1, 2, 3]);
        let err = tree.delete(&9).unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(tree.len(), 3);
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_last_delete_empties_tree() {
        let mut tree = tree_with(3, &[5]);
        tree.delete(&5).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn test_merge_with_left_collapses_root() {
        // [3] -> [1 2] | [3]
        let mut tree = tree_with(3, &[1, 2, 3]);
        tree.delete(&1).unwrap();
        assert_eq!(tree.height(), 2);

        // [2] | [3]: the right leaf empties and merges into the left one.
        tree.delete(&3).unwrap();
        assert_eq!(tree.height(), 1);
        assert_eq!(leaf_keys(&tree), vec![vec![2]]);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_merge_with_right_when_leftmost() {
        // [3] -> [1 2] | [3 4]; leaves at degree 4 need 2 keys.
        let mut tree = tree_with(4, &[1, 2, 3, 4]);
        tree.delete(&1).unwrap();
        assert_eq!(leaf_keys(&tree), vec![vec![2, 3, 4]]);
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_redistribute_updates_separator() {
        let mut tree = tree_with(4, &[1, 2, 3, 4, 5]);
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2], vec![3, 4, 5]]);
        tree.delete(&1).unwrap();
        // Left leaf [2] is under-utilized; merging would need 4 slots, so it
        // borrows 3 from the right.
        assert_eq!(leaf_keys(&tree), vec![vec![2, 3], vec![4, 5]]);
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).unwrap().keys(), &[4]);

        tree.insert(1, 10).unwrap();
        // [1 2 3] | [4 5]; dropping 5 leaves [4], which borrows 3.
        tree.delete(&5).unwrap();
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(tree.node(root).unwrap().keys(), &[3]);
    }

    #[test]
    fn test_internal_merge_pulls_separator_down() {
        let mut tree = tree_with(3, &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(tree.height(), 3);
        for k in [7, 6, 5] {
            tree.delete(&k).unwrap();
        }
        assert_eq!(tree.height(), 2);
        assert_eq!(leaf_keys(&tree).concat(), vec![1, 2, 3, 4]);
        for k in 1..=4 {
            assert_eq!(tree.get(&k), Some(&(k * 10)));
        }
    }

    #[test]
    fn test_internal_redistribute_from_left_rotates_through_parent() {
        // [5] -> P[3](A[1 2], B[3 4]) | Q[7](C[5 6], D[7])
        let mut tree = tree_with(3, &[1, 2, 3, 4, 5, 6, 7]);
        // Splits A, so P holds three leaves: [0 1] [2] [3 4].
        tree.insert(0, 0).unwrap();

        let root = tree.root().unwrap();
        let p = tree.child(root, 0).unwrap();
        let q = tree.child(root, 1).unwrap();
        let b = tree.child(p, 2).unwrap();
        let c = tree.child(q, 0).unwrap();
        assert_eq!(tree.node(root).unwrap().keys(), &[5]);
        assert_eq!(tree.node(p).unwrap().keys(), &[2, 3]);
        assert_eq!(tree.node(q).unwrap().keys(), &[7]);

        // D merges into C and Q drops to one child. P has three children,
        // too many to merge, so Q borrows P's last child.
        tree.delete(&7).unwrap();

        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.node(root).unwrap().keys(), &[3]);
        assert_eq!(tree.node(p).unwrap().keys(), &[2]);
        assert_eq!(tree.node(p).unwrap().pointer_count(), 2);
        assert_eq!(tree.node(q).unwrap().keys(), &[5]);
        assert_eq!(tree.child(q, 0), Some(b));
        assert_eq!(tree.child(q, 1), Some(c));
        assert_eq!(
            leaf_keys(&tree),
            vec![vec![0, 1], vec![2], vec![3, 4], vec![5, 6]]
        );
        tree.validate().unwrap();
    }

    #[test]
    fn test_churn_reuses_released_nodes() {
        let mut tree = tree_with(3, &[]);
        let mut high_water = None;
        for _ in 0..200 {
            for k in 0..64 {
                tree.insert(k, k).unwrap();
            }
            for k in 0..64 {
                tree.delete(&k).unwrap();
            }
            assert_eq!(tree.node_count(), 0);

            let slots = tree.arena.allocated_count();
            assert!(slots < 130, "arena grew to {slots} slots");
            assert_eq!(*high_water.get_or_insert(slots), slots);
        }
    }
}
