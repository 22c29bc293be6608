//! Reactive Context
//!
//! The reactive context holds the two pieces of ambient state that creation
//! and reads consult:
//!
//! - the **owner**: the computation that adopts newly created computations and
//!   cleanups, so they are torn down when it re-runs or is disposed;
//! - the **listener**: the computation that records an edge whenever a signal
//!   or memo is read.
//!
//! # Implementation
//!
//! Both live in `Cell`s inside the thread's runtime. Switching them returns a
//! [`ContextGuard`] that puts the previous values back when dropped, so the
//! context is restored on every exit path including `?` returns and panics
//! unwinding out of user code.

use std::cell::Cell;

use crate::graph::NodeKey;

/// Who adopts computations created in the current scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    /// A live computation or root.
    Node(NodeKey),

    /// An explicit "no owner" scope. Creations here are intentionally
    /// detached and do not warn.
    Unowned,
}

#[derive(Debug, Default)]
pub(crate) struct Context {
    owner: Cell<Option<Owner>>,
    listener: Cell<Option<NodeKey>>,
}

impl Context {
    pub fn owner(&self) -> Option<Owner> {
        self.owner.get()
    }

    pub fn listener(&self) -> Option<NodeKey> {
        self.listener.get()
    }

    /// Switch both owner and listener until the guard drops.
    pub fn enter(&self, owner: Option<Owner>, listener: Option<NodeKey>) -> ContextGuard<'_> {
        ContextGuard {
            context: self,
            owner: self.owner.replace(owner),
            listener: self.listener.replace(listener),
        }
    }

    /// Switch only the owner.
    pub fn enter_owner(&self, owner: Option<Owner>) -> ContextGuard<'_> {
        self.enter(owner, self.listener.get())
    }

    /// Stop recording reads until the guard drops.
    pub fn untracked(&self) -> ContextGuard<'_> {
        self.enter(self.owner.get(), None)
    }
}

/// Restores the previous owner and listener when dropped.
pub(crate) struct ContextGuard<'a> {
    context: &'a Context,
    owner: Option<Owner>,
    listener: Option<NodeKey>,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.context.owner.set(self.owner);
        self.context.listener.set(self.listener);
    }
}
