//! In-memory B+ tree index for Arbor.
//!
//! This crate provides:
//! - `BPlusTree`, a unique-key B+ tree with node splitting on insert and
//!   merging or redistribution on delete
//! - Read-only structural access (root, children, leaf chain) and a textual
//!   dump of the node layout
//! - `SharedBPlusTree`, a lock-protected handle for multi-threaded use
//! - Script replay for line-oriented insert/delete sequences

mod btree;
pub mod script;

pub use arbor_common::{ArborError, Result, TreeConfig, DEFAULT_DEGREE, MIN_DEGREE};
pub use btree::tree::Iter;
pub use btree::{
    BPlusTree, InternalNode, LeafNode, Node, NodeId, NodeLabels, SharedBPlusTree,
};
