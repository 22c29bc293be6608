//! Equality-Checked Signals
//!
//! A [`ValueSignal`] skips writes equal to the last written value, so readers
//! only re-run on real changes. The last written value is the one staged in
//! the current batch if there is one, and the current value otherwise. A
//! staged value the runtime discards after a failure therefore stops counting
//! as written. Two unequal writes in the same batch cannot both be honoured
//! and fail with [`Error::ConflictingValues`].

use std::fmt;
use std::rc::Rc;

use super::signal::Signal;
use crate::error::{Error, Result};

type Equality<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// A signal that ignores writes equal to its last written value.
pub struct ValueSignal<T> {
    signal: Signal<T>,
    eq: Equality<T>,
}

impl<T: Clone + 'static> ValueSignal<T> {
    /// Create a signal compared with `PartialEq`.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_eq(value, PartialEq::eq)
    }

    /// Create a signal compared with a custom equality.
    pub fn with_eq(value: T, eq: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            signal: Signal::new(value),
            eq: Rc::new(eq),
        }
    }

    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    pub fn get_untracked(&self) -> T {
        self.signal.get_untracked()
    }

    /// Write `value` unless it equals the last written value.
    pub fn set(&self, value: T) -> Result<()> {
        let (same, staged) = self
            .signal
            .with_latest(|last, staged| ((self.eq)(last, &value), staged));
        match (same, staged) {
            (true, _) => Ok(()),
            (false, true) => Err(Error::ConflictingValues),
            (false, false) => self.signal.write(value, |staged, value| (self.eq)(staged, value)),
        }
    }

    pub(crate) fn signal(&self) -> &Signal<T> {
        &self.signal
    }
}

impl<T> Clone for ValueSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            eq: Rc::clone(&self.eq),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSignal")
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}
