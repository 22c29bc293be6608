//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, memos, effects,
//! and the ownership tree that disposes them.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! while a computation runs, the signal records that computation as a reader.
//! When the signal's value changes, its readers re-run.
//!
//! ## Memos
//!
//! A Memo is a derived value. It re-evaluates whenever one of the values it
//! read on its last run changes, at most once per change, and never against a
//! mix of old and new inputs.
//!
//! ## Effects
//!
//! An Effect is a memo run for its side effects. Effects are used to
//! synchronize reactive state with the outside world.
//!
//! ## Ownership
//!
//! A computation created while another one runs belongs to it. When the
//! parent re-runs or is disposed, its children are disposed first and its
//! cleanups run. Top-level computations belong to a root.
//!
//! # Implementation Notes
//!
//! Every thread has its own runtime holding the dependency graph and a
//! logical clock. Writes are applied in batches: each batch commits its
//! staged writes at one logical time and then updates every affected
//! computation exactly once.

mod context;
mod effect;
mod memo;
mod on;
mod root;
mod runtime;
mod signal;
mod value;

pub use effect::Effect;
pub use memo::Memo;
pub use on::{track_fn, Track, TrackFn};
pub use root::{create_root, create_unowned_root, freeze, on_cleanup, sample, Disposer};
pub use runtime::{Runtime, RuntimeStats};
pub use signal::Signal;
pub use value::ValueSignal;
