//! Leaf nodes: sorted key/value pairs plus a successor link.

use super::arena::NodeId;

/// A B+Tree leaf.
///
/// `values[i]` belongs to `keys[i]`. The successor link chains leaves left to
/// right in key order; it is a plain id and does not own the next leaf.
#[derive(Debug, Clone)]
pub struct LeafNode<K, V> {
    /// Maximum pointer fan-out. The node holds at most `degree - 1` keys.
    degree: usize,
    keys: Vec<K>,
    values: Vec<V>,
    successor: Option<NodeId>,
}

impl<K, V> LeafNode<K, V> {
    /// Creates an empty leaf.
    pub fn new(degree: usize) -> Self {
        let capacity = degree.saturating_sub(1);
        Self {
            degree,
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            successor: None,
        }
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
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    #[inline]
    pub fn key(&self, i: usize) -> Option<&K> {
        self.keys.get(i)
    }

    #[inline]
    pub fn value(&self, i: usize) -> Option<&V> {
        self.values.get(i)
    }

    #[inline]
    pub fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    /// Returns the next leaf in key order.
    #[inline]
    pub fn successor(&self) -> Option<NodeId> {
        self.successor
    }

    /// Sets the successor link and returns the previous one.
    pub fn set_successor(&mut self, successor: Option<NodeId>) -> Option<NodeId> {
        std::mem::replace(&mut self.successor, successor)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.keys.len() >= self.capacity()
    }

    /// True when a non-root leaf holds fewer than ⌈(D-1)/2⌉ keys.
    #[inline]
    pub fn is_under_utilized(&self) -> bool {
        self.keys.len() < self.capacity().div_ceil(2)
    }

    /// True when both leaves' entries fit in one leaf.
    #[inline]
    pub fn mergeable(&self, other: &LeafNode<K, V>) -> bool {
        self.keys.len() + other.keys.len() <= self.capacity()
    }

    /// Inserts a pair at a fixed position, shifting later entries right.
    pub(crate) fn insert_at(&mut self, i: usize, key: K, value: V) {
        self.keys.insert(i, key);
        self.values.insert(i, value);
    }

    /// Removes the pair at a fixed position, shifting later entries left.
    pub(crate) fn remove_at(&mut self, i: usize) -> (K, V) {
        (self.keys.remove(i), self.values.remove(i))
    }

    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        if self.keys.is_empty() {
            return None;
        }
        Some(self.remove_at(0))
    }

    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        let key = self.keys.pop()?;
        let value = self.values.pop()?;
        Some((key, value))
    }

    pub(crate) fn push_front(&mut self, key: K, value: V) {
        self.insert_at(0, key, value);
    }

    pub(crate) fn push_back(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    /// Appends every entry of `right` and takes over its successor link.
    pub(crate) fn merge_from(&mut self, right: LeafNode<K, V>) {
        self.keys.extend(right.keys);
        self.values.extend(right.values);
        self.successor = right.successor;
    }
}

impl<K: Ord, V> LeafNode<K, V> {
    /// Binary search for a key: Ok(position) or Err(insertion point).
    #[inline]
    pub fn search(&self, key: &K) -> Result<usize, usize> {
        self.keys.binary_search(key)
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_ok()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.search(key).ok().map(|i| &self.values[i])
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.search(key) {
            Ok(i) => Some(&mut self.values[i]),
            Err(_) => None,
        }
    }

    /// Inserts a pair in sorted position. The caller guarantees room and
    /// that the key is not already present.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        debug_assert!(self.keys.len() < self.capacity());
        let i = match self.search(&key) {
            Ok(i) | Err(i) => i,
        };
        self.insert_at(i, key, value);
    }

    /// Removes a key and returns its value, or None without touching the leaf.
    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let i = self.search(key).ok()?;
        Some(self.remove_at(i).1)
    }

    /// Splits a full leaf while inserting one more pair.
    ///
    /// The entries plus the new pair are staged in a degree+1 buffer, the
    /// first ⌈D/2⌉ go back into `self` and the rest form the returned upper
    /// leaf. Successor links are left to the caller, which knows the new id.
    pub(crate) fn split_insert(&mut self, key: K, value: V) -> LeafNode<K, V> {
        let mut staging = LeafNode::new(self.degree + 1);
        staging.keys = std::mem::take(&mut self.keys);
        staging.values = std::mem::take(&mut self.values);
        staging.insert(key, value);

        let split = self.degree.div_ceil(2);
        let mut upper = LeafNode::new(self.degree);
        upper.keys = staging.keys.split_off(split);
        upper.values = staging.values.split_off(split);

        self.keys = staging.keys;
        self.values = staging.values;
        upper
    }
}
