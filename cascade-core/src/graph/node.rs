//! Graph Nodes
//!
//! This module defines the node types that live in the dependency graph.
//! Nodes only carry graph bookkeeping. Typed values stay with the handles
//! ([`Signal`](crate::Signal), [`Memo`](crate::Memo)), and a computation
//! reaches its value through its type-erased runner.

use std::fmt;

use super::log::EdgeList;
use super::NodeKey;
use crate::error::Result;

/// Re-evaluates a computation and stores the new value.
pub type Runner = Box<dyn FnMut() -> Result<()>>;

/// Cleanup callback. The flag is `true` when the owner is being disposed and
/// `false` when it is only about to re-run.
pub type Cleanup = Box<dyn FnOnce(bool)>;

/// Staleness state of a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// The value reflects the current logical time.
    Current,

    /// An upstream value changed; the node must re-run before it is read.
    Stale,

    /// The node is evaluating. Reading it now is a cycle.
    Running,

    /// The node is being torn down and will leave the graph.
    Disposed,
}

/// A signal's graph entry: only its readers.
#[derive(Debug, Default)]
pub struct DataNode {
    pub log: EdgeList,
}

/// A computation's graph entry.
pub struct ComputationNode {
    /// `None` until the node is claimed, while it runs, and after disposal.
    pub run: Option<Runner>,
    pub state: NodeState,
    /// Logical time at which the node was last marked or claimed.
    pub age: u64,
    /// Producers read during the last evaluation.
    pub sources: EdgeList,
    /// Computations that read this one.
    pub log: EdgeList,
    /// Computations created during the last evaluation.
    pub owned: Vec<NodeKey>,
    pub cleanups: Vec<Cleanup>,
}

impl ComputationNode {
    pub fn new() -> Self {
        Self {
            run: None,
            state: NodeState::Current,
            age: 0,
            sources: EdgeList::default(),
            log: EdgeList::default(),
            owned: Vec::new(),
            cleanups: Vec::new(),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.state == NodeState::Disposed
    }
}

impl Default for ComputationNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComputationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputationNode")
            .field("state", &self.state)
            .field("age", &self.age)
            .field("sources", &self.sources.len())
            .field("readers", &self.log.len())
            .field("owned", &self.owned)
            .field("cleanups", &self.cleanups.len())
            .finish_non_exhaustive()
    }
}

/// A node in the dependency graph.
#[derive(Debug)]
pub enum Node {
    /// A signal. Signals have readers but never sources.
    Data(DataNode),

    /// A memo, effect, or root.
    Computation(ComputationNode),
}

impl Node {
    /// The readers of this node.
    pub fn log(&self) -> &EdgeList {
        match self {
            Self::Data(node) => &node.log,
            Self::Computation(node) => &node.log,
        }
    }

    pub fn log_mut(&mut self) -> &mut EdgeList {
        match self {
            Self::Data(node) => &mut node.log,
            Self::Computation(node) => &mut node.log,
        }
    }

    /// Whether reads of this node may still be recorded.
    pub fn accepts_readers(&self) -> bool {
        match self {
            Self::Data(_) => true,
            Self::Computation(node) => !node.is_disposed(),
        }
    }
}

// ---- Tests ----
