//! Slot arena owning every B+Tree node.

use std::fmt;

use arbor_common::Result;

use super::consistency_fault;
use super::internal::InternalNode;
use super::leaf::LeafNode;
use super::node::Node;

/// Stable identity of a node within one tree.
///
/// Released slots are reused, but every release bumps the slot's
/// generation, so an id is never handed to a second node and stale ids
/// stay detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    slot: u32,
    generation: u32,
}

impl NodeId {
    /// Returns the slot index.
    #[inline]
    pub fn slot(self) -> u32 {
        self.slot
    }

    /// Returns how many times the slot was released before this id.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn from_raw(slot: u32) -> Self {
        NodeId { slot, generation: 0 }
    }

    #[inline]
    fn index(self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.slot)
        } else {
            write!(f, "#{}v{}", self.slot, self.generation)
        }
    }
}

struct Slot<K, V> {
    generation: u32,
    node: Option<Node<K, V>>,
}

/// Contiguous node storage with a free list.
///
/// A slot index maps directly to a Vec index. A released slot goes on the
/// free list with its generation bumped, so ids naming the released node
/// fault instead of aliasing the node that reuses the slot.
pub struct NodeArena<K, V> {
    slots: Vec<Slot<K, V>>,
    /// Released slot indices, reused LIFO.
    free: Vec<u32>,
    /// Number of occupied slots.
    live: usize,
}

impl<K, V> NodeArena<K, V> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Stores a node and returns its id, reusing a released slot if any.
    pub fn allocate(&mut self, node: Node<K, V>) -> Result<NodeId> {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                let slot = u32::try_from(self.slots.len()).map_err(|_| {
                    consistency_fault(format!("node arena exhausted at {} slots", self.slots.len()))
                })?;
                self.slots.push(Slot {
                    generation: 0,
                    node: None,
                });
                slot
            }
        };

        let entry = &mut self.slots[slot as usize];
        entry.node = Some(node);
        self.live += 1;
        Ok(NodeId {
            slot,
            generation: entry.generation,
        })
    }

    /// Removes a node from the arena and hands it back to the caller.
    pub fn release(&mut self, id: NodeId) -> Result<Node<K, V>> {
        let entry = self
            .slots
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation)
            .ok_or_else(|| consistency_fault(format!("release of dead node {id}")))?;
        let node = entry
            .node
            .take()
            .ok_or_else(|| consistency_fault(format!("release of dead node {id}")))?;

        // A slot whose generation would wrap is retired instead of reused.
        if let Some(next) = entry.generation.checked_add(1) {
            entry.generation = next;
            self.free.push(id.slot);
        }
        self.live -= 1;
        Ok(node)
    }

    /// Gets a node by id, or None if it was never allocated or was released.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.slots
            .get(id.index())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_ref())
    }

    /// Gets a node that the tree structure says must exist.
    #[inline]
    pub fn get(&self, id: NodeId) -> Result<&Node<K, V>> {
        self.node(id)
            .ok_or_else(|| consistency_fault(format!("dangling node id {id}")))
    }

    /// Mutable variant of [`NodeArena::get`].
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node<K, V>> {
        self.slots
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_mut())
            .ok_or_else(|| consistency_fault(format!("dangling node id {id}")))
    }

    pub fn leaf(&self, id: NodeId) -> Result<&LeafNode<K, V>> {
        self.get(id)?
            .as_leaf()
            .ok_or_else(|| consistency_fault(format!("node {id} is not a leaf")))
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> Result<&mut LeafNode<K, V>> {
        self.get_mut(id)?
            .as_leaf_mut()
            .ok_or_else(|| consistency_fault(format!("node {id} is not a leaf")))
    }

    pub fn internal(&self, id: NodeId) -> Result<&InternalNode<K>> {
        self.get(id)?
            .as_internal()
            .ok_or_else(|| consistency_fault(format!("node {id} is not an internal node")))
    }

    pub fn internal_mut(&mut self, id: NodeId) -> Result<&mut InternalNode<K>> {
        self.get_mut(id)?
            .as_internal_mut()
            .ok_or_else(|| consistency_fault(format!("node {id} is not an internal node")))
    }

    /// Number of live nodes.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of slots backing the arena, live or free.
    ///
    /// This is the high-water mark of live nodes, not the number of
    /// allocations ever made.
    #[cfg(test)]
    pub fn allocated_count(&self) -> usize {
        self.slots.len()
    }
}

impl<K, V> Default for NodeArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
