//! Worklists
//!
//! A [`Queue`] is an append-only list that is drained front to back once per
//! propagation pass and then handed back empty, so its buffer is reused by the
//! next pass instead of being reallocated.

use std::cell::RefCell;
use std::mem;

use crate::error::Result;

/// Append-only worklist with index-reset semantics.
#[derive(Debug)]
pub struct Queue<T> {
    items: Vec<T>,
}

impl<T> Queue<T> {
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Forget every queued item.
    pub fn reset(&mut self) {
        self.items.clear();
    }

    /// Move the queued items out, leaving the queue empty.
    pub fn take(&mut self) -> Vec<T> {
        mem::take(&mut self.items)
    }

    /// Give a drained buffer back so its capacity is reused.
    ///
    /// Items added while the buffer was out are kept.
    pub fn recycle(&mut self, mut items: Vec<T>) {
        if self.items.is_empty() {
            items.clear();
            self.items = items;
        }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f` over every queued item until the queue stays empty.
///
/// The queue is not borrowed while `f` runs, so `f` may enqueue more work; it
/// is drained in the same call, after the items already queued. If `f`
/// fails, the items after the failing one are dropped and the error is
/// returned.
pub fn drain<T>(queue: &RefCell<Queue<T>>, mut f: impl FnMut(T) -> Result<()>) -> Result<()> {
    loop {
        let mut items = queue.borrow_mut().take();
        if items.is_empty() {
            queue.borrow_mut().recycle(items);
            return Ok(());
        }
        let result = items.drain(..).try_for_each(&mut f);
        queue.borrow_mut().recycle(items);
        result?;
    }
}
