//! Thread-safe handle over a single tree.

use std::fmt::{Debug, Display};
use std::sync::Arc;

use arbor_common::{Result, TreeConfig};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::tree::BPlusTree;

/// Cloneable, lock-protected B+ tree.
///
/// Mutations take the write lock for their whole duration; lookups and dumps
/// share the read lock. The tree itself is never latched per node.
pub struct SharedBPlusTree<K, V> {
    inner: Arc<RwLock<BPlusTree<K, V>>>,
}

impl<K, V> Clone for SharedBPlusTree<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedBPlusTree<K, V> {
    pub fn new(degree: usize) -> Result<Self> {
        Ok(Self::from_tree(BPlusTree::new(degree)?))
    }

    pub fn with_config(config: TreeConfig) -> Result<Self> {
        Ok(Self::from_tree(BPlusTree::with_config(config)?))
    }

    pub fn from_tree(tree: BPlusTree<K, V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Shared access for several reads under one lock.
    pub fn read(&self) -> RwLockReadGuard<'_, BPlusTree<K, V>> {
        self.inner.read()
    }

    /// Exclusive access for several mutations under one lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, BPlusTree<K, V>> {
        self.inner.write()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl<K: Ord + Clone + Debug, V> SharedBPlusTree<K, V> {
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        self.inner.write().insert(key, value)
    }

    pub fn delete(&self, key: &K) -> Result<V> {
        self.inner.write().delete(key)
    }

    pub fn validate(&self) -> Result<()> {
        self.inner.read().validate()
    }
}

impl<K: Ord, V: Clone> SharedBPlusTree<K, V> {
    /// Returns a copy of the value under `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }
}

impl<K: Display, V: Display> SharedBPlusTree<K, V> {
    pub fn dump(&self) -> Result<String> {
        self.inner.read().dump()
    }
}
