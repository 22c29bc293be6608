//! Dependency Graph
//!
//! This module stores the dependency graph that links signals to the
//! computations reading them.
//!
//! # Overview
//!
//! - Nodes live in a [`Slab`] arena and are addressed by a generational
//!   [`NodeKey`]. Freed slots are reused by the next insertion, which is how
//!   computations that turn out to have no dependencies are recycled.
//! - Every edge is stored at both ends (see the `log` module) so that a computation can
//!   drop all of its sources before re-running without scanning producers.
//! - A key whose slot has since been freed or reused no longer resolves:
//!   every lookup checks the generation. Readers may therefore keep dangling
//!   source edges to a disposed node; they are skipped when unlinked.
//!
//! The graph holds no user values and never runs user code.

mod clock;
mod log;
mod node;
mod queue;

use slab::Slab;

pub use clock::{BatchGuard, Clock, PendingChange};
use log::Edge;
pub use node::{Cleanup, ComputationNode, DataNode, Node, NodeState, Runner};
pub use queue::drain;

/// Generational address of a node in the [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    index: usize,
    generation: u32,
}

impl NodeKey {
    #[cfg(test)]
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Arena of signal and computation nodes.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Slab<Node>,
    generations: Vec<u32>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of slots ever allocated. Grows only when no freed slot is
    /// available for reuse.
    pub fn slots(&self) -> usize {
        self.generations.len()
    }

    pub fn insert(&mut self, node: Node) -> NodeKey {
        let index = self.nodes.vacant_key();
        if index == self.generations.len() {
            self.generations.push(0);
        }
        let generation = self.generations[index];
        self.nodes.insert(node);
        NodeKey { index, generation }
    }

    /// Free the node's slot. Later lookups with `key` fail.
    pub fn remove(&mut self, key: NodeKey) -> Option<Node> {
        if !self.contains(key) {
            return None;
        }
        if let Some(generation) = self.generations.get_mut(key.index) {
            *generation = generation.wrapping_add(1);
        }
        self.nodes.try_remove(key.index)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.generations.get(key.index) == Some(&key.generation) && self.nodes.contains(key.index)
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        if self.contains(key) {
            self.nodes.get(key.index)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        if self.contains(key) {
            self.nodes.get_mut(key.index)
        } else {
            None
        }
    }

    pub fn computation(&self, key: NodeKey) -> Option<&ComputationNode> {
        match self.get(key) {
            Some(Node::Computation(node)) => Some(node),
            _ => None,
        }
    }

    pub fn computation_mut(&mut self, key: NodeKey) -> Option<&mut ComputationNode> {
        match self.get_mut(key) {
            Some(Node::Computation(node)) => Some(node),
            _ => None,
        }
    }

    /// Whether `key` is a computation that has not been disposed.
    pub fn is_live_computation(&self, key: NodeKey) -> bool {
        self.computation(key).is_some_and(|node| !node.is_disposed())
    }

    pub fn has_readers(&self, key: NodeKey) -> bool {
        self.get(key).is_some_and(|node| !node.log().is_empty())
    }

    /// Keys of the computations reading `key`, first slot first.
    pub fn readers(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.get(key)
            .into_iter()
            .flat_map(|node| node.log().iter().map(|edge| edge.node))
    }

    /// Record that `reader` read `producer`.
    ///
    /// Repeated reads record repeated edges. Returns `false` when either end
    /// is gone or disposed.
    pub fn link(&mut self, producer: NodeKey, reader: NodeKey) -> bool {
        let reader_slot = match self.computation(reader) {
            Some(node) if !node.is_disposed() => node.sources.next_slot(),
            _ => return false,
        };
        let log_slot = match self.get_mut(producer) {
            Some(node) if node.accepts_readers() => node.log_mut().push(Edge {
                node: reader,
                slot: reader_slot,
            }),
            _ => return false,
        };
        if let Some(node) = self.computation_mut(reader) {
            node.sources.push(Edge {
                node: producer,
                slot: log_slot,
            });
        }
        true
    }

    /// Remove every source edge of `reader` from the producers' logs.
    ///
    /// Edges are removed in place so that a swap-remove which moves another
    /// edge of the same reader repairs a slot that is still pending removal.
    pub fn unlink_sources(&mut self, reader: NodeKey) {
        while let Some(source) = self.computation_mut(reader).and_then(|node| node.sources.pop()) {
            self.unlink(source);
        }
    }

    fn unlink(&mut self, source: Edge) {
        let Some(producer) = self.get_mut(source.node) else {
            return;
        };
        if let Some((moved, slot)) = producer.log_mut().remove(source.slot) {
            if let Some(reader) = self.computation_mut(moved.node) {
                reader.sources.relink(moved.slot, slot);
            }
        }
    }
}

// ---- Tests ----
