//! Insertion with leaf splits and upward split propagation.

use std::fmt::Debug;

use arbor_common::{ArborError, Result};
use tracing::debug;

use super::arena::NodeId;
use super::consistency_fault;
use super::internal::InternalNode;
use super::leaf::LeafNode;
use super::navigator::{find_leaf, ParentMap};
use super::node::Node;
use super::tree::BPlusTree;

impl<K: Ord + Clone + Debug, V> BPlusTree<K, V> {
    /// Inserts a new key/value pair.
    ///
    /// Fails with `DuplicateKey` and leaves the tree untouched when the key
    /// is already present.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let Some(root) = self.root else {
            let mut leaf = LeafNode::new(self.degree());
            leaf.insert(key, value);
            let id = self.arena.allocate(Node::Leaf(leaf))?;
            self.root = Some(id);
            self.len = 1;
            debug!(root = %id, "created root leaf");
            return self.after_mutation();
        };

        let mut parents = ParentMap::new();
        let leaf_id = find_leaf(&self.arena, root, &key, Some(&mut parents))?;
        let leaf = self.arena.leaf_mut(leaf_id)?;
        if leaf.contains(&key) {
            return Err(ArborError::duplicate_key(&key));
        }

        if !leaf.is_full() {
            leaf.insert(key, value);
            self.len += 1;
            return self.after_mutation();
        }

        let mut upper = leaf.split_insert(key, value);
        upper.set_successor(leaf.successor());
        let separator = upper.first_key().cloned().ok_or_else(|| {
            consistency_fault(format!("split of leaf {leaf_id} left an empty half"))
        })?;
        let upper_id = self.arena.allocate(Node::Leaf(upper))?;
        self.arena.leaf_mut(leaf_id)?.set_successor(Some(upper_id));
        self.len += 1;
        debug!(leaf = %leaf_id, new_leaf = %upper_id, separator = ?separator, "split leaf");

        self.insert_in_parent(leaf_id, separator, upper_id, &parents)?;
        self.after_mutation()
    }

    /// Links `right` into the tree as the sibling following `left`,
    /// separated by `key`. Splits full ancestors on the way up.
    fn insert_in_parent(
        &mut self,
        left: NodeId,
        key: K,
        right: NodeId,
        parents: &ParentMap,
    ) -> Result<()> {
        if self.root == Some(left) {
            let root = InternalNode::with_children(self.degree(), left, key, right);
            let root_id = self.arena.allocate(Node::Internal(root))?;
            self.root = Some(root_id);
            debug!(root = %root_id, height = self.height(), "grew new root");
            return Ok(());
        }

        let parent_id = parents.parent_of(left)?;
        let parent = self.arena.internal_mut(parent_id)?;
        if !parent.is_full() {
            return parent.insert_after(key, right, left);
        }

        let (middle, upper) = parent.split_insert_after(key, right, left)?;
        let upper_id = self.arena.allocate(Node::Internal(upper))?;
        debug!(
            node = %parent_id,
            new_node = %upper_id,
            separator = ?middle,
            "split internal node"
        );
        self.insert_in_parent(parent_id, middle, upper_id, parents)
    }
}
