//! Logical Clock
//!
//! The clock owns logical time and the three worklists of a batch:
//!
//! 1. **changes**: signals holding a staged value, applied at the start of a
//!    pass;
//! 2. **updates**: computations marked stale by those changes;
//! 3. **disposes**: roots whose disposal was requested mid-batch.
//!
//! Time starts at 1 so that the zero age of a fresh node never equals "now".
//! It advances once per propagation pass after the first, and once per
//! write applied outside any batch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::queue::Queue;
use super::NodeKey;

/// A staged signal write waiting in the changes worklist.
pub trait PendingChange {
    /// Make the staged value current and return the signal's node.
    fn commit(&self) -> NodeKey;

    /// Drop the staged value without applying it.
    fn discard(&self);
}

pub struct Clock {
    time: Cell<u64>,
    running: Cell<bool>,
    pub changes: RefCell<Queue<Rc<dyn PendingChange>>>,
    pub updates: RefCell<Queue<NodeKey>>,
    pub disposes: RefCell<Queue<NodeKey>>,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            time: Cell::new(1),
            running: Cell::new(false),
            changes: RefCell::new(Queue::new()),
            updates: RefCell::new(Queue::new()),
            disposes: RefCell::new(Queue::new()),
        }
    }

    pub fn time(&self) -> u64 {
        self.time.get()
    }

    pub fn tick(&self) -> u64 {
        let time = self.time.get() + 1;
        self.time.set(time);
        time
    }

    /// Whether a batch is open. Writes made while it is are staged.
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Mark a batch open until the guard is dropped.
    pub fn enter(&self) -> BatchGuard<'_> {
        BatchGuard {
            clock: self,
            was_running: self.running.replace(true),
        }
    }

    pub fn has_work(&self) -> bool {
        !self.changes.borrow().is_empty()
            || !self.updates.borrow().is_empty()
            || !self.disposes.borrow().is_empty()
    }

    /// Discard every staged signal value.
    pub fn discard_changes(&self) -> usize {
        let changes = self.changes.borrow_mut().take();
        for change in &changes {
            change.discard();
        }
        changes.len()
    }

    /// Drop all outstanding work, returning how many entries were dropped.
    pub fn abandon(&self) -> usize {
        let mut dropped = self.discard_changes();

        let mut updates = self.updates.borrow_mut();
        dropped += updates.len();
        updates.reset();
        drop(updates);

        let mut disposes = self.disposes.borrow_mut();
        dropped += disposes.len();
        disposes.reset();

        dropped
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Restores the previous "batch running" flag on drop.
///
/// The outermost guard also abandons all outstanding work when it is dropped
/// by a panic, so nothing staged by the failed batch leaks into the next.
pub struct BatchGuard<'a> {
    clock: &'a Clock,
    was_running: bool,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.clock.running.set(self.was_running);
        if !self.was_running && std::thread::panicking() {
            let dropped = self.clock.abandon();
            if dropped > 0 {
                tracing::warn!(dropped, "batch unwound by a panic; abandoning unfinished work");
            }
        }
    }
}

// ---- Tests ----
