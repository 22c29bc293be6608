//! Error Types
//!
//! Every fallible operation in the engine returns [`Result`]. Errors are never
//! swallowed by the propagation loop: they unwind out of the computation that
//! raised them, out of the pass, and out of the top-level call that started
//! the batch.

use std::error::Error as StdError;
use std::fmt::Display;

/// Errors raised by the reactive engine or by user computations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A signal was written with two different values inside one batch.
    #[error("conflicting changes: a signal was set to two different values in one batch")]
    WriteConflict,

    /// An equality-checked signal was written with two unequal values at the
    /// same logical time.
    #[error("conflicting values: two unequal values were written at the same logical time")]
    ConflictingValues,

    /// A computation read itself (directly or transitively) while running.
    #[error("circular dependency")]
    CircularDependency,

    /// Propagation did not settle within the configured number of passes.
    #[error("runaway clock detected after {iterations} propagation passes")]
    Runaway {
        /// Number of passes executed before giving up.
        iterations: usize,
    },

    /// A user computation failed.
    #[error(transparent)]
    Computation(Box<dyn StdError + Send + Sync + 'static>),
}

impl Error {
    /// Wrap an arbitrary error raised by a computation.
    pub fn computation<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self::Computation(err.into())
    }

    /// Build a computation error from a message.
    pub fn msg(msg: impl Display) -> Self {
        Self::Computation(msg.to_string().into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
