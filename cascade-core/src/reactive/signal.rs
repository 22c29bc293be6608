//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! records which computations read it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while a computation is running, an edge from the
//!    signal to that computation is recorded.
//!
//! 2. Writing a signal that nobody reads applies the value immediately.
//!
//! 3. Writing a signal that has readers stages the value as *pending* and
//!    runs a propagation, after which every reader has re-run against the new
//!    value. Inside a batch ([`freeze`](crate::freeze) or a running
//!    computation) the write is only staged; readers keep seeing the old value
//!    until the batch applies it.
//!
//! 4. Two different values written in the same batch are a conflict.
//!
//! # Memory Layout
//!
//! Each signal consists of:
//! - A graph node holding its readers
//! - The current value and the staged value, behind one shared `Rc`
//!
//! The graph node is released when the last handle is dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::runtime::Runtime;
use crate::error::{Error, Result};
use crate::graph::{NodeKey, PendingChange};

/// A reactive signal holding a value of type `T`.
///
/// Cloning a signal clones the handle, not the value.
///
/// # Example
///
/// ```rust
/// use cascade_core::{Memo, Signal};
///
/// let count = Signal::new(1);
/// let doubled = Memo::new({
///     let count = count.clone();
///     move || Ok(count.get() * 2)
/// })?;
///
/// count.set(5)?;
/// assert_eq!(doubled.get()?, 10);
/// # Ok::<(), cascade_core::Error>(())
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

struct SignalInner<T> {
    key: NodeKey,
    value: RefCell<T>,
    pending: RefCell<Option<T>>,
}

impl<T: 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        let key = Runtime::with(|rt| rt.create_data());
        Self {
            inner: Rc::new(SignalInner {
                key,
                value: RefCell::new(value),
                pending: RefCell::new(None),
            }),
        }
    }

    /// Get the current value.
    ///
    /// If called while a computation is running, this also registers the
    /// computation as a reader.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.register_read();
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value, registering a read like [`get`](Self::get).
    ///
    /// # Panics
    ///
    /// Panics if `f` writes this signal outside a batch.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.register_read();
        f(&self.inner.value.borrow())
    }

    /// Get the current value without registering a read.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Write a new value.
    ///
    /// Fails with [`Error::WriteConflict`] if a different value is already
    /// staged in the current batch, or with whatever error propagation hits
    /// when the write starts one.
    pub fn set(&self, value: T) -> Result<()>
    where
        T: PartialEq,
    {
        self.write(value, PartialEq::eq)
    }

    /// Write `f(&current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<()>
    where
        T: PartialEq,
    {
        let value = f(&self.inner.value.borrow());
        self.set(value)
    }

    /// Write a value, deciding staged-value conflicts with `same`.
    pub(crate) fn write(&self, value: T, same: impl FnOnce(&T, &T) -> bool) -> Result<()> {
        Runtime::with(|rt| {
            if rt.is_batching() {
                let mut pending = self.inner.pending.borrow_mut();
                if let Some(staged) = pending.as_ref() {
                    return if same(staged, &value) {
                        Ok(())
                    } else {
                        Err(Error::WriteConflict)
                    };
                }
                *pending = Some(value);
                drop(pending);
                rt.stage(self.inner.clone());
                Ok(())
            } else if rt.has_readers(self.inner.key) {
                *self.inner.pending.borrow_mut() = Some(value);
                rt.stage(self.inner.clone());
                rt.event()
            } else {
                *self.inner.value.borrow_mut() = value;
                rt.tick();
                Ok(())
            }
        })
    }

    /// Call `f` with the staged value, or the current one when nothing is
    /// staged, and whether the value is staged.
    pub(crate) fn with_latest<R>(&self, f: impl FnOnce(&T, bool) -> R) -> R {
        let pending = self.inner.pending.borrow();
        match pending.as_ref() {
            Some(staged) => f(staged, true),
            None => f(&self.inner.value.borrow(), false),
        }
    }

    pub(crate) fn register_read(&self) {
        Runtime::with(|rt| rt.track(self.inner.key));
    }

    #[cfg(test)]
    pub(crate) fn key(&self) -> NodeKey {
        self.inner.key
    }
}

impl<T> PendingChange for SignalInner<T> {
    fn commit(&self) -> NodeKey {
        if let Some(value) = self.pending.borrow_mut().take() {
            *self.value.borrow_mut() = value;
        }
        self.key
    }

    fn discard(&self) {
        self.pending.borrow_mut().take();
    }
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        let key = self.key;
        Runtime::try_with(|rt| rt.release_data(key));
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("key", &self.inner.key)
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// ---- Tests ----
