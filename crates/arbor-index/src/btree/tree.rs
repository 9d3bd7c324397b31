//! The B+ tree handle: configuration, node arena and root.

use std::fmt;

use arbor_common::{Result, TreeConfig};
use tracing::debug;

use super::arena::{NodeArena, NodeId};
use super::leaf::LeafNode;
use super::navigator::find_leaf;
use super::node::Node;

/// In-memory B+ tree mapping unique keys to values.
///
/// Mutation takes `&mut self`; there is no internal latching. Wrap the tree
/// in a [`SharedBPlusTree`](super::SharedBPlusTree) to share it between
/// threads.
///
/// Insert and delete live in their own modules and extend this type.
pub struct BPlusTree<K, V> {
    pub(super) config: TreeConfig,
    pub(super) arena: NodeArena<K, V>,
    pub(super) root: Option<NodeId>,
    pub(super) len: usize,
}

impl<K, V> BPlusTree<K, V> {
    /// Creates an empty tree of the given degree.
    pub fn new(degree: usize) -> Result<Self> {
        Self::with_config(TreeConfig::with_degree(degree))
    }

    /// Creates an empty tree after validating `config`.
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            degree = config.degree,
            check_invariants = config.check_invariants,
            "created B+ tree"
        );
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TreeConfig) -> Self {
        Self {
            config,
            arena: NodeArena::new(),
            root: None,
            len: 0,
        }
    }

    /// Maximum number of pointers per node.
    #[inline]
    pub fn degree(&self) -> usize {
        self.config.degree
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Root node, or None when the tree is empty.
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Read-only view of a live node.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.arena.node(id)
    }

    /// The `i`-th child of an internal node.
    ///
    /// None for leaves, dead ids and indices past the last child.
    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.arena.node(id)?.as_internal()?.child(i)
    }

    /// Leftmost leaf, where the leaf chain starts.
    pub fn first_leaf(&self) -> Option<NodeId> {
        let mut current = self.root?;
        loop {
            match self.arena.node(current)? {
                Node::Leaf(_) => return Some(current),
                Node::Internal(internal) => current = internal.child(0)?,
            }
        }
    }

    /// Next leaf in key order.
    pub fn successor(&self, leaf: NodeId) -> Option<NodeId> {
        self.arena.node(leaf)?.as_leaf()?.successor()
    }

    /// Number of key/value pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels, 0 for an empty tree and 1 for a lone root leaf.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(id) = current {
            height += 1;
            current = self.child(id, 0);
        }
        height
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.arena.live_count()
    }

    /// Iterates over all pairs in key order by walking the leaf chain.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            arena: &self.arena,
            leaf: self.first_leaf().and_then(|id| self.arena.node(id)?.as_leaf()),
            pos: 0,
            remaining: self.len,
        }
    }
}

impl<K: Ord, V> BPlusTree<K, V> {
    fn leaf_for(&self, key: &K) -> Option<&LeafNode<K, V>> {
        let root = self.root?;
        let leaf = find_leaf(&self.arena, root, key, None).ok()?;
        self.arena.node(leaf)?.as_leaf()
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.leaf_for(key)?.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.leaf_for(key).is_some_and(|leaf| leaf.contains(key))
    }

    /// Mutable access to the value under `key`. Keys cannot be changed.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let root = self.root?;
        let leaf = find_leaf(&self.arena, root, key, None).ok()?;
        self.arena.leaf_mut(leaf).ok()?.get_mut(key)
    }
}

impl<K, V> Default for BPlusTree<K, V> {
    fn default() -> Self {
        Self::from_valid_config(TreeConfig::default())
    }
}

impl<K, V> fmt::Debug for BPlusTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BPlusTree")
            .field("degree", &self.config.degree)
            .field("len", &self.len)
            .field("height", &self.height())
            .field("root", &self.root)
            .finish()
    }
}

/// In-order iterator over a tree's pairs, following successor links.
pub struct Iter<'a, K, V> {
    arena: &'a NodeArena<K, V>,
    leaf: Option<&'a LeafNode<K, V>>,
    pos: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        loop {
            let leaf = self.leaf?;
            if let (Some(key), Some(value)) = (leaf.key(self.pos), leaf.value(self.pos)) {
                self.pos += 1;
                self.remaining = self.remaining.saturating_sub(1);
                return Some((key, value));
            }
            self.leaf = leaf
                .successor()
                .and_then(|id| arena.node(id))
                .and_then(Node::as_leaf);
            self.pos = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a BPlusTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_common::{ArborError, DEFAULT_DEGREE};

    #[test]
    fn test_new_rejects_small_degree() {
        for degree in 0..3 {
            let err = BPlusTree::<u32, u32>::new(degree).unwrap_err();
            assert!(matches!(err, ArborError::InvalidDegree { .. }));
        }
        assert!(BPlusTree::<u32, u32>::new(3).is_ok());
    }

    #[test]
    fn test_empty_tree() {
        let tree: BPlusTree<u32, u32> = BPlusTree::default();
        assert_eq!(tree.degree(), DEFAULT_DEGREE);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.root(), None);
        assert_eq!(tree.first_leaf(), None);
        assert_eq!(tree.get(&1), None);
        assert!(!tree.contains_key(&1));
        assert_eq!(tree.iter().next(), None);
    }

    #[test]
    fn test_lookup_after_inserts() {
        let mut tree = BPlusTree::new(3).unwrap();
        for k in [5u32, 1, 9, 3, 7] {
            tree.insert(k, k * 2).unwrap();
        }
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.get(&7), Some(&14));
        assert_eq!(tree.get(&4), None);
        assert!(tree.contains_key(&1));

        *tree.get_mut(&3).unwrap() = 100;
        assert_eq!(tree.get(&3), Some(&100));
        assert!(tree.get_mut(&8).is_none());
    }

    #[test]
    fn test_structure_accessors() {
        let mut tree = BPlusTree::new(3).unwrap();
        for k in 1u32..=3 {
            tree.insert(k, ()).unwrap();
        }
        // [3] -> [1, 2] | [3]
        let root = tree.root().unwrap();
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.node(root).unwrap().keys(), &[3]);

        let left = tree.child(root, 0).unwrap();
        let right = tree.child(root, 1).unwrap();
        assert_eq!(tree.child(root, 2), None);
        assert_eq!(tree.child(left, 0), None);
        assert_eq!(tree.first_leaf(), Some(left));
        assert_eq!(tree.successor(left), Some(right));
        assert_eq!(tree.successor(right), None);
        assert_eq!(tree.successor(root), None);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_iter_in_key_order() {
        let mut tree = BPlusTree::new(4).unwrap();
        for k in [8u32, 2, 6, 4, 10, 0] {
            tree.insert(k, k + 1).unwrap();
        }
        let keys: Vec<u32> = tree.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![0, 2, 4, 6, 8, 10]);
        assert_eq!(tree.iter().len(), 6);

        let total: u32 = (&tree).into_iter().map(|(_, v)| *v).sum();
        assert_eq!(total, 36);
    }

    #[test]
    fn test_debug_summary() {
        let mut tree = BPlusTree::new(3).unwrap();
        tree.insert(1u8, 'a').unwrap();
        let text = format!("{tree:?}");
        assert!(text.contains("degree: 3"));
        assert!(text.contains("len: 1"));
    }
}
