//! Node variants shared by the tree engines.

use super::internal::InternalNode;
use super::leaf::LeafNode;

/// A B+Tree node: either a leaf holding values or an internal router.
#[derive(Debug, Clone)]
pub enum Node<K, V> {
    Leaf(LeafNode<K, V>),
    Internal(InternalNode<K>),
}

impl<K, V> Node<K, V> {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    #[inline]
    pub fn degree(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.degree(),
            Node::Internal(internal) => internal.degree(),
        }
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.keys().len()
    }

    pub fn keys(&self) -> &[K] {
        match self {
            Node::Leaf(leaf) => leaf.keys(),
            Node::Internal(internal) => internal.keys(),
        }
    }

    #[inline]
    pub fn key(&self, i: usize) -> Option<&K> {
        self.keys().get(i)
    }

    /// Number of occupied pointer slots, `key_count + 1` for both variants.
    ///
    /// For a leaf this counts the values plus the successor slot.
    #[inline]
    pub fn pointer_count(&self) -> usize {
        self.key_count() + 1
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        match self {
            Node::Leaf(leaf) => leaf.is_full(),
            Node::Internal(internal) => internal.is_full(),
        }
    }

    /// Occupancy check for a non-root node.
    #[inline]
    pub fn is_under_utilized(&self) -> bool {
        match self {
            Node::Leaf(leaf) => leaf.is_under_utilized(),
            Node::Internal(internal) => internal.is_under_utilized(),
        }
    }

    /// True when `self` and `other` are the same kind and fit in one node.
    pub fn mergeable(&self, other: &Node<K, V>) -> bool {
        match (self, other) {
            (Node::Leaf(a), Node::Leaf(b)) => a.mergeable(b),
            (Node::Internal(a), Node::Internal(b)) => a.mergeable(b),
            _ => false,
        }
    }

    #[inline]
    pub fn as_leaf(&self) -> Option<&LeafNode<K, V>> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Internal(_) => None,
        }
    }

    #[inline]
    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafNode<K, V>> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Internal(_) => None,
        }
    }

    #[inline]
    pub fn as_internal(&self) -> Option<&InternalNode<K>> {
        match self {
            Node::Internal(internal) => Some(internal),
            Node::Leaf(_) => None,
        }
    }

    #[inline]
    pub fn as_internal_mut(&mut self) -> Option<&mut InternalNode<K>> {
        match self {
            Node::Internal(internal) => Some(internal),
            Node::Leaf(_) => None,
        }
    }
}
