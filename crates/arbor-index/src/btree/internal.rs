//! Internal (non-leaf) nodes: separator keys routing to child nodes.

use arbor_common::Result;

use super::arena::NodeId;
use super::consistency_fault;

/// A B+Tree internal node.
///
/// Always holds one more child than keys. `children[i]` covers keys k with
/// `keys[i-1] <= k < keys[i]`, open-ended at both ends.
#[derive(Debug, Clone)]
pub struct InternalNode<K> {
    /// Maximum number of children.
    degree: usize,
    keys: Vec<K>,
    children: Vec<NodeId>,
}

impl<K> InternalNode<K> {
    /// Creates an internal node with no children.
    fn empty(degree: usize) -> Self {
        Self {
            degree,
            keys: Vec::with_capacity(degree.saturating_sub(1)),
            children: Vec::with_capacity(degree),
        }
    }

    /// Creates a node with exactly two children separated by `key`.
    pub fn with_children(degree: usize, left: NodeId, key: K, right: NodeId) -> Self {
        let mut node = Self::empty(degree);
        node.children.push(left);
        node.keys.push(key);
        node.children.push(right);
        node
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Maximum number of keys.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.degree - 1
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn key(&self, i: usize) -> Option<&K> {
        self.keys.get(i)
    }

    #[inline]
    pub fn child(&self, i: usize) -> Option<NodeId> {
        self.children.get(i).copied()
    }

    /// Position of a child among this node's pointers.
    pub fn index_of(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.keys.len() >= self.capacity()
    }

    /// True when a non-root node has fewer than ⌈D/2⌉ children.
    #[inline]
    pub fn is_under_utilized(&self) -> bool {
        self.children.len() < self.degree.div_ceil(2)
    }

    /// True when both nodes plus the separator pulled down from the parent
    /// fit in one node, i.e. the combined children number at most D.
    #[inline]
    pub fn mergeable(&self, other: &InternalNode<K>) -> bool {
        self.children.len() + other.children.len() <= self.degree
    }

    /// Inserts `key` and `child` right after the pointer `after`.
    pub(crate) fn insert_after(&mut self, key: K, child: NodeId, after: NodeId) -> Result<()> {
        let i = self
            .index_of(after)
            .ok_or_else(|| consistency_fault(format!("node {after} is not a child")))?;
        self.keys.insert(i, key);
        self.children.insert(i + 1, child);
        Ok(())
    }

    /// Replaces the key between two adjacent children and returns the old key.
    pub(crate) fn change_key(&mut self, left: NodeId, right: NodeId, key: K) -> Result<K> {
        let i = self
            .children
            .windows(2)
            .position(|pair| pair[0] == left && pair[1] == right)
            .ok_or_else(|| {
                consistency_fault(format!("children {left} and {right} are not adjacent"))
            })?;
        Ok(std::mem::replace(&mut self.keys[i], key))
    }

    /// Removes the first key together with the first child.
    pub(crate) fn pop_first(&mut self) -> Option<(K, NodeId)> {
        if self.keys.is_empty() {
            return None;
        }
        Some((self.keys.remove(0), self.children.remove(0)))
    }

    /// Removes the last key together with the last child.
    pub(crate) fn pop_last(&mut self) -> Option<(K, NodeId)> {
        if self.keys.is_empty() {
            return None;
        }
        let child = self.children.pop()?;
        let key = self.keys.pop()?;
        Some((key, child))
    }

    /// Prepends a key and a child; the child becomes the new first child.
    pub(crate) fn push_front(&mut self, key: K, child: NodeId) {
        self.keys.insert(0, key);
        self.children.insert(0, child);
    }

    /// Appends a key and a child; the child becomes the new last child.
    pub(crate) fn push_back(&mut self, key: K, child: NodeId) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Absorbs `right`, pulling the parent's separator down between the two.
    pub(crate) fn merge_from(&mut self, separator: K, right: InternalNode<K>) {
        self.keys.push(separator);
        self.keys.extend(right.keys);
        self.children.extend(right.children);
    }

    /// Splits a full node while inserting `key`/`child` after `after`.
    ///
    /// Stages D keys and D+1 children, keeps the first ⌈(D+1)/2⌉ children in
    /// `self`, moves the rest into the returned node, and hands back the
    /// middle key, which belongs to neither half.
    pub(crate) fn split_insert_after(
        &mut self,
        key: K,
        child: NodeId,
        after: NodeId,
    ) -> Result<(K, InternalNode<K>)> {
        let mut staging = InternalNode::empty(self.degree + 1);
        staging.keys = std::mem::take(&mut self.keys);
        staging.children = std::mem::take(&mut self.children);
        if let Err(e) = staging.insert_after(key, child, after) {
            self.keys = staging.keys;
            self.children = staging.children;
            return Err(e);
        }

        let split = (self.degree + 1).div_ceil(2);
        let mut upper = InternalNode::empty(self.degree);
        upper.keys = staging.keys.split_off(split);
        upper.children = staging.children.split_off(split);
        let middle = staging
            .keys
            .pop()
            .ok_or_else(|| consistency_fault("split of an internal node without keys"))?;

        self.keys = staging.keys;
        self.children = staging.children;
        Ok((middle, upper))
    }
}

impl<K: Ord> InternalNode<K> {
    /// Index of the child responsible for `key`.
    ///
    /// A key equal to `keys[i]` routes right of it, to `children[i + 1]`.
    #[inline]
    pub fn child_index_for(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k <= key)
    }

    /// Child responsible for `key`.
    #[inline]
    pub fn child_for(&self, key: &K) -> NodeId {
        self.children[self.child_index_for(key)]
    }

    /// Removes a separator key and the child pointer that follows it.
    pub(crate) fn remove(&mut self, key: &K) -> Option<(K, NodeId)> {
        let i = self.keys.binary_search(key).ok()?;
        Some((self.keys.remove(i), self.children.remove(i + 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> NodeId {
        NodeId::from_raw(raw)
    }

    /// Builds a node with children 0..=keys.len() and the given keys.
    fn node(degree: usize, keys: &[u32]) -> InternalNode<u32> {
        let mut node = InternalNode::with_children(degree, id(0), keys[0], id(1));
        for (i, &k) in keys.iter().enumerate().skip(1) {
            node.push_back(k, id(i as u32 + 1));
        }
        node
    }

    #[test]
    fn test_child_selection() {
        let node = node(4, &[10, 20, 30]);
        assert_eq!(node.child_for(&5), id(0));
        assert_eq!(node.child_for(&10), id(1));
        assert_eq!(node.child_for(&15), id(1));
        assert_eq!(node.child_for(&20), id(2));
        assert_eq!(node.child_for(&30), id(3));
        assert_eq!(node.child_for(&99), id(3));
    }

    #[test]
    fn test_insert_after() {
        let mut node = node(4, &[10]);
        node.insert_after(5, id(7), id(0)).unwrap();
        assert_eq!(node.keys(), &[5, 10]);
        assert_eq!(node.children(), &[id(0), id(7), id(1)]);

        assert!(node.insert_after(1, id(8), id(42)).is_err());
        assert_eq!(node.key_count(), 2);
    }

    #[test]
    fn test_remove_drops_following_child() {
        let mut node = node(4, &[10, 20, 30]);
        assert_eq!(node.remove(&20), Some((20, id(2))));
        assert_eq!(node.keys(), &[10, 30]);
        assert_eq!(node.children(), &[id(0), id(1), id(3)]);
        assert_eq!(node.remove(&25), None);
        assert_eq!(node.child_count(), 3);
    }

    #[test]
    fn test_change_key_requires_adjacent_children() {
        let mut node = node(4, &[10, 20]);
        assert_eq!(node.change_key(id(1), id(2), 15).unwrap(), 20);
        assert_eq!(node.keys(), &[10, 15]);

        assert!(node.change_key(id(0), id(2), 5).is_err());
        assert!(node.change_key(id(2), id(1), 5).is_err());
        assert_eq!(node.keys(), &[10, 15]);
    }

    #[test]
    fn test_utilization_thresholds() {
        // Degree 3: 2..=3 children. Degree 5: 3..=5 children.
        assert!(!node(3, &[1]).is_under_utilized());
        assert!(node(5, &[1]).is_under_utilized());
        assert!(!node(5, &[1, 2]).is_under_utilized());

        assert!(!node(3, &[1]).mergeable(&node(3, &[5])));
        assert!(node(4, &[1]).mergeable(&node(4, &[5])));
        assert!(!node(4, &[1]).mergeable(&node(4, &[5, 6])));
    }

    #[test]
    fn test_split_degree_three() {
        // Keys [c, d, f] staged; left keeps one key, "d" moves up.
        let mut node = InternalNode::with_children(3, id(0), 'd', id(1));
        node.push_back('f', id(2));
        let (middle, upper) = node.split_insert_after('c', id(3), id(0)).unwrap();

        assert_eq!(middle, 'd');
        assert_eq!(node.keys(), &['c']);
        assert_eq!(node.children(), &[id(0), id(3)]);
        assert_eq!(upper.keys(), &['f']);
        assert_eq!(upper.children(), &[id(1), id(2)]);
    }

    #[test]
    fn test_split_degree_four() {
        let mut node = node(4, &[10, 20, 30]);
        let (middle, upper) = node.split_insert_after(35, id(9), id(3)).unwrap();

        assert_eq!(node.keys(), &[10, 20]);
        assert_eq!(node.children(), &[id(0), id(1), id(2)]);
        assert_eq!(middle, 30);
        assert_eq!(upper.keys(), &[35]);
        assert_eq!(upper.children(), &[id(3), id(9)]);
    }

    #[test]
    fn test_split_with_unknown_anchor_restores_node() {
        let mut node = node(3, &[10, 20]);
        assert!(node.split_insert_after(15, id(9), id(42)).is_err());
        assert_eq!(node.keys(), &[10, 20]);
        assert_eq!(node.child_count(), 3);
    }

    #[test]
    fn test_merge_pulls_separator_down() {
        let mut left = node(5, &[10]);
        let mut right = InternalNode::with_children(5, id(5), 40, id(6));
        right.push_back(50, id(7));

        left.merge_from(30, right);
        assert_eq!(left.keys(), &[10, 30, 40, 50]);
        assert_eq!(left.children(), &[id(0), id(1), id(5), id(6), id(7)]);
    }

    #[test]
    fn test_pop_and_push_ends() {
        let mut node = node(5, &[10, 20, 30]);
        assert_eq!(node.pop_first(), Some((10, id(0))));
        assert_eq!(node.pop_last(), Some((30, id(3))));
        assert_eq!(node.keys(), &[20]);
        assert_eq!(node.children(), &[id(1), id(2)]);

        node.push_front(5, id(8));
        node.push_back(40, id(9));
        assert_eq!(node.keys(), &[5, 20, 40]);
        assert_eq!(node.children(), &[id(8), id(1), id(2), id(9)]);
    }
}
