//! Memo Implementation
//!
//! A Memo is a derived value. Its function runs once at creation and again
//! each time one of the values it read during its last run changes.
//!
//! # How Memos Work
//!
//! 1. Creation runs the function immediately with the memo as the active
//!    listener, recording every signal and memo it reads.
//!
//! 2. A change to any of those marks the memo stale; the propagation pass
//!    re-runs it. Before each re-run the memo drops all of its old
//!    dependencies, disposes the computations it created last time, and runs
//!    its cleanups, so dependencies always reflect the latest run.
//!
//! 3. A computation that reads a memo which is stale in the current pass
//!    updates it on the spot. Readers never observe a value older than the
//!    signals they have already seen.
//!
//! 4. A memo whose first run read nothing can never change. Its graph node is
//!    recycled right away and the handle keeps the value.
//!
//! # Reducers
//!
//! [`Memo::with_seed`] passes the previous value into each run, starting
//! from the seed.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::runtime::Runtime;
use crate::error::Result;
use crate::graph::NodeKey;

/// A derived reactive value.
///
/// Cloning a memo clones the handle. Dropping every handle does not stop the
/// computation; disposal is governed by its owner.
pub struct Memo<T> {
    /// `None` once the node has been recycled.
    node: Option<NodeKey>,
    value: Rc<RefCell<T>>,
}

impl<T: 'static> Memo<T> {
    /// Create a memo from a function of tracked reads.
    pub fn new<F>(f: F) -> Result<Self>
    where
        F: FnMut() -> Result<T> + 'static,
    {
        Self::build(f, |f| f(), |f, _| f())
    }

    /// Create a reducing memo: each run receives the previous value, the
    /// first one receives `seed`.
    pub fn with_seed<F>(seed: T, f: F) -> Result<Self>
    where
        T: Clone,
        F: FnMut(T) -> Result<T> + 'static,
    {
        Self::build(f, move |f| f(seed), |f, prev| f(prev.clone()))
    }

    fn build<F>(
        f: F,
        first: impl FnOnce(&mut F) -> Result<T>,
        next: fn(&mut F, &T) -> Result<T>,
    ) -> Result<Self>
    where
        F: 'static,
    {
        let (node, value) = Runtime::with(|rt| rt.create_computation(f, first, next))?;
        Ok(Self { node, value })
    }

    /// Get the current value, registering a read if a computation is
    /// running.
    ///
    /// Fails with [`Error::CircularDependency`](crate::Error::CircularDependency)
    /// when the memo is read from its own run, and with the memo's error when
    /// reading forces a stale memo to update and that update fails.
    pub fn get(&self) -> Result<T>
    where
        T: Clone,
    {
        self.register_read()?;
        Ok(self.value.borrow().clone())
    }

    /// Borrow the current value, registering a read like [`get`](Self::get).
    ///
    /// # Panics
    ///
    /// Panics if `f` writes a source of this memo outside a batch: the
    /// propagation re-runs the memo while its value is still borrowed. Use
    /// [`get`](Self::get) when the value is needed across such writes.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        self.register_read()?;
        Ok(f(&self.value.borrow()))
    }

    /// Get the value without registering a read or updating.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Whether the memo can still re-run: it read something and has not been
    /// disposed.
    pub fn is_live(&self) -> bool {
        self.node
            .is_some_and(|node| Runtime::with(|rt| rt.is_live(node)))
    }

    pub(crate) fn node(&self) -> Option<NodeKey> {
        self.node
    }

    pub(crate) fn register_read(&self) -> Result<()> {
        match self.node {
            Some(node) => Runtime::with(|rt| rt.read_computation(node)),
            None => Ok(()),
        }
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            value: Rc::clone(&self.value),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("node", &self.node)
            .field("value", &*self.value.borrow())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
