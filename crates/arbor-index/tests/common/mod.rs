//! Shared helpers for the integration tests.
//!
//! Set `RUST_LOG` (e.g. `arbor_index=debug`) to see split, merge and
//! redistribution events while a test runs.

#![allow(dead_code)]

use std::sync::Once;

use arbor_index::{BPlusTree, NodeId};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a test-friendly subscriber once per test binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .compact()
            .try_init();
    });
}

/// Collects the keys of every leaf by walking the successor chain.
pub fn leaf_chain<K: Clone, V>(tree: &BPlusTree<K, V>) -> Vec<Vec<K>> {
    let mut leaves = Vec::new();
    let mut next = tree.first_leaf();
    while let Some(id) = next {
        leaves.push(node_keys(tree, id));
        next = tree.successor(id);
    }
    leaves
}

pub fn node_keys<K: Clone, V>(tree: &BPlusTree<K, V>, id: NodeId) -> Vec<K> {
    tree.node(id).map(|n| n.keys().to_vec()).unwrap_or_default()
}

/// Builds a `String -> i64` tree of the given degree from `(key, value)` pairs.
pub fn string_tree(degree: usize, pairs: &[(&str, i64)]) -> BPlusTree<String, i64> {
    let mut tree = BPlusTree::new(degree).unwrap();
    for &(k, v) in pairs {
        tree.insert(k.to_string(), v).unwrap();
    }
    tree
}
