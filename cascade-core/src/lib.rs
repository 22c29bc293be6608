//! Cascade Core
//!
//! This crate provides a synchronous, glitch-free reactive computation
//! engine. It implements:
//!
//! - Reactive primitives (signals, equality-checked signals, memos, effects)
//! - Dependency tracking discovered from the reads each computation performs
//! - Batched propagation on a logical clock, with conflict detection
//! - An ownership tree that disposes nested computations and runs cleanups
//!
//! Everything runs on the calling thread. Each thread has its own runtime;
//! handles are `!Send`.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: the public primitives and the per-thread runtime
//! - `graph`: the node arena, edge lists, and the clock's worklists
//!
//! # Example
//!
//! ```rust
//! use cascade_core::{create_root, Effect, Memo, Signal};
//! use std::{cell::RefCell, rc::Rc};
//!
//! let printed = Rc::new(RefCell::new(Vec::new()));
//!
//! create_root(|_dispose| -> cascade_core::Result<()> {
//!     // Create a signal
//!     let count = Signal::new(0);
//!
//!     // Create a derived value
//!     let doubled = Memo::new({
//!         let count = count.clone();
//!         move || Ok(count.get() * 2)
//!     })?;
//!
//!     // Create an effect
//!     Effect::new({
//!         let (count, printed) = (count.clone(), printed.clone());
//!         move || {
//!             let line = format!("Count: {}, Doubled: {}", count.get(), doubled.get()?);
//!             printed.borrow_mut().push(line);
//!             Ok(())
//!         }
//!     })?;
//!
//!     // Update the signal; the effect runs before `set` returns
//!     count.set(5)
//! })?;
//!
//! assert_eq!(printed.borrow().last().unwrap(), "Count: 5, Doubled: 10");
//! # Ok::<(), cascade_core::Error>(())
//! ```

pub mod config;
pub mod error;
mod graph;
pub mod reactive;

pub use config::Config;
pub use error::{Error, Result};
pub use reactive::{
    create_root, create_unowned_root, freeze, on_cleanup, sample, track_fn, Disposer, Effect,
    Memo, Runtime, RuntimeStats, Signal, Track, TrackFn, ValueSignal,
};
