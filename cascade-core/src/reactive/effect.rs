//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the effect re-runs within the same
//!    propagation, before the write that caused it returns.
//!
//! 3. Before re-running, the effect drops its old dependencies and tracks
//!    new ones during execution.
//!
//! # Differences from Memo
//!
//! An effect is a memo whose value nobody reads: the same node, the same
//! scheduling. The handle only reports whether the effect can still run.
//!
//! # Cleanup
//!
//! Register teardown work with [`on_cleanup`](crate::on_cleanup) from inside
//! the effect. It runs before the next run and when the effect is disposed.

use super::memo::Memo;
use super::runtime::Runtime;
use crate::error::Result;
use crate::graph::NodeKey;

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use cascade_core::{Effect, Signal};
///
/// let count = Signal::new(0);
/// let log = Signal::new(Vec::new());
///
/// Effect::new({
///     let (count, log) = (count.clone(), log.clone());
///     move || {
///         let seen = count.get();
///         log.set(vec![seen])
///     }
/// })?;
///
/// count.set(5)?;
/// assert_eq!(log.get(), vec![5]);
/// # Ok::<(), cascade_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Effect {
    node: Option<NodeKey>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    pub fn new<F>(mut f: F) -> Result<Self>
    where
        F: FnMut() -> Result<()> + 'static,
    {
        Memo::new(move || f()).map(Self::from_memo)
    }

    /// Create an effect that threads a value from one run to the next,
    /// starting from `seed`.
    pub fn with_seed<T, F>(seed: T, f: F) -> Result<Self>
    where
        T: Clone + 'static,
        F: FnMut(T) -> Result<T> + 'static,
    {
        Memo::with_seed(seed, f).map(Self::from_memo)
    }

    pub(crate) fn from_memo<T: 'static>(memo: Memo<T>) -> Self {
        Self { node: memo.node() }
    }

    /// Whether the effect will never run again: it read nothing, or its
    /// owner has been disposed.
    pub fn is_inert(&self) -> bool {
        !self
            .node
            .is_some_and(|node| Runtime::with(|rt| rt.is_live(node)))
    }
}

// ---- Tests ----
