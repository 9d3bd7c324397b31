//! In-memory B+ tree with unique keys.
//!
//! Nodes live in a `NodeArena` and refer to each other by [`NodeId`].
//! Internal nodes own routing keys and child ids; leaves own the key/value
//! pairs and link to their successor so that the leaf level can be walked
//! in key order.
//!
//! ```text
//!                 [ d ]                  internal: children[i] < keys[i] <= children[i+1]
//!               /       \
//!         [ c ]           [ f ]
//!        /     \         /     \
//!    [a b] -> [c]  ->  [d]  ->  [f g]    leaves: successor chain
//! ```
//!
//! Nodes carry no parent pointer. Insert and delete record the path from the
//! root in a `ParentMap` while descending and use it to propagate splits
//! and merges upward.
//!
//! Occupancy bounds for degree D (D >= 3):
//! - leaf: at most D-1 keys, at least ⌈(D-1)/2⌉ unless it is the root
//! - internal: at most D children, at least ⌈D/2⌉ unless it is the root
//!   (a root has at least 2)

pub mod dump;
pub mod internal;
pub mod leaf;
pub mod node;
pub mod shared;
pub mod tree;

mod arena;
mod delete;
mod insert;
mod navigator;
mod validate;

use arbor_common::ArborError;

pub use arena::NodeId;
pub use dump::NodeLabels;
pub use internal::InternalNode;
pub use leaf::LeafNode;
pub use node::Node;
pub use shared::SharedBPlusTree;
pub use tree::BPlusTree;

/// Builds an `InternalConsistency` error and reports it.
///
/// These errors mean the tree structure itself is broken, so they are always
/// logged at error level where they are raised.
pub(crate) fn consistency_fault(msg: impl Into<String>) -> ArborError {
    let msg = msg.into();
    tracing::error!(fault = %msg, "B+ tree consistency fault");
    ArborError::InternalConsistency(msg)
}
