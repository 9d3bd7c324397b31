//! Textual rendering of tree structure.
//!
//! Each node prints as its label followed by every pointer and key slot up
//! to capacity, with `null` for unused slots:
//!
//! ```text
//!  @0(@1, d, @2, null, null)
//!   @1(5, b, 1, c, @2)
//!   @2(2, d, null, null, null)
//! ```
//!
//! Internal slots hold child labels. Leaf slots hold values, except the last
//! one which holds the successor label. Lines are indented one space per
//! level, starting with one space for the root.

use std::collections::HashMap;
use std::fmt::{self, Display, Write};

use arbor_common::Result;

use super::arena::NodeId;
use super::node::Node;
use super::tree::BPlusTree;

/// Display labels for nodes, assigned on first sight.
///
/// Reusing one `NodeLabels` across several dumps of the same tree keeps the
/// labels of surviving nodes stable, so successive dumps can be compared.
#[derive(Debug, Default, Clone)]
pub struct NodeLabels {
    labels: HashMap<NodeId, usize>,
}

impl NodeLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label for `id`, assigning the next free one if it has none yet.
    pub fn label(&mut self, id: NodeId) -> usize {
        let next = self.labels.len();
        *self.labels.entry(id).or_insert(next)
    }

    /// Label previously assigned to `id`.
    pub fn get(&self, id: NodeId) -> Option<usize> {
        self.labels.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn write_pointer(&mut self, out: &mut impl Write, id: Option<NodeId>) -> fmt::Result {
        match id {
            Some(id) => write!(out, "@{}", self.label(id)),
            None => out.write_str("null"),
        }
    }
}

fn write_slot<T: Display>(out: &mut impl Write, item: Option<&T>) -> fmt::Result {
    match item {
        Some(item) => write!(out, "{item}"),
        None => out.write_str("null"),
    }
}

fn write_node<K: Display, V: Display>(
    out: &mut impl Write,
    id: NodeId,
    node: &Node<K, V>,
    degree: usize,
    labels: &mut NodeLabels,
) -> fmt::Result {
    write!(out, "@{}(", labels.label(id))?;
    for i in 0..degree - 1 {
        match node {
            Node::Leaf(leaf) => write_slot(out, leaf.value(i))?,
            Node::Internal(internal) => labels.write_pointer(out, internal.child(i))?,
        }
        out.write_str(", ")?;
        write_slot(out, node.key(i))?;
        out.write_str(", ")?;
    }
    let last = match node {
        Node::Leaf(leaf) => leaf.successor(),
        Node::Internal(internal) => internal.child(degree - 1),
    };
    labels.write_pointer(out, last)?;
    out.write_char(')')
}

impl<K: Display, V: Display> BPlusTree<K, V> {
    /// Renders a single node, e.g. `@3(5, b, null, null, @4)`.
    pub fn render_node(&self, id: NodeId, labels: &mut NodeLabels) -> Result<String> {
        let node = self.arena.get(id)?;
        let mut out = String::new();
        write_node(&mut out, id, node, self.degree(), labels)?;
        Ok(out)
    }

    /// Renders the whole tree with fresh labels. An empty tree renders as "".
    pub fn dump(&self) -> Result<String> {
        self.dump_with(&mut NodeLabels::new())
    }

    /// Renders the whole tree, reusing and extending `labels`.
    pub fn dump_with(&self, labels: &mut NodeLabels) -> Result<String> {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.dump_subtree(&mut out, root, 1, labels)?;
        }
        Ok(out)
    }

    /// Writes `id` and its subtree, one node per line.
    fn dump_subtree(
        &self,
        out: &mut String,
        id: NodeId,
        level: usize,
        labels: &mut NodeLabels,
    ) -> Result<()> {
        let node = self.arena.get(id)?;
        if !out.is_empty() {
            out.push('\n');
        }
        write!(out, "{:level$}", "")?;
        write_node(out, id, node, self.degree(), labels)?;
        if let Node::Internal(internal) = node {
            for &child in internal.children() {
                self.dump_subtree(out, child, level + 1, labels)?;
            }
        }
        Ok(())
    }
}
