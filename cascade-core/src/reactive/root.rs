//! Roots, Batching, and Untracked Reads
//!
//! Computations created inside another computation belong to it and are
//! disposed when it re-runs. Computations created anywhere else need a root:
//! [`create_root`] gives them an owner that lives until its [`Disposer`] is
//! called, and [`create_unowned_root`] marks them as deliberately ownerless.

use super::runtime::Runtime;
use crate::error::Result;
use crate::graph::NodeKey;

/// Disposes the root it was handed out by.
///
/// Disposal tears down every computation created under the root, running
/// their cleanups with `true`. Inside a batch it is deferred until the
/// current pass has finished its updates. Disposing twice does nothing.
#[derive(Debug, Clone, Copy)]
pub struct Disposer {
    root: NodeKey,
}

impl Disposer {
    pub fn dispose(&self) {
        Runtime::with(|rt| rt.dispose_root(self.root));
    }
}

/// Run `f` with a fresh root as owner and return its result.
///
/// ```rust
/// use cascade_core::{create_root, Effect, Signal};
///
/// let signal = Signal::new(0);
/// let dispose = create_root(|dispose| {
///     let signal = signal.clone();
///     Effect::new(move || {
///         signal.get();
///         Ok(())
///     })
///     .map(|_| dispose)
/// })?;
///
/// dispose.dispose();
/// # Ok::<(), cascade_core::Error>(())
/// ```
pub fn create_root<R>(f: impl FnOnce(Disposer) -> R) -> R {
    Runtime::with(|rt| rt.create_root(|root| f(Disposer { root })))
}

/// Run `f` with no owner. Computations created inside are never disposed and
/// no warning is logged for them.
pub fn create_unowned_root<R>(f: impl FnOnce() -> R) -> R {
    Runtime::with(|rt| rt.create_unowned(f))
}

/// Run `f` as one batch: every write inside is staged and applied together
/// when `f` returns, in a single propagation.
///
/// Inside an open batch `f` just runs. If `f` or the propagation fails, the
/// staged writes are dropped and the error is returned.
pub fn freeze<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
    Runtime::with(|rt| rt.freeze(f))
}

/// Run `f` without registering any reads on the running computation.
pub fn sample<R>(f: impl FnOnce() -> R) -> R {
    Runtime::with(|rt| rt.sample(f))
}

/// Register `f` to run before the owning computation next re-runs (with
/// `false`) or when it is disposed (with `true`).
///
/// Without an owner `f` would never run; it is dropped and a warning is
/// logged.
pub fn on_cleanup(f: impl FnOnce(bool) + 'static) {
    Runtime::with(|rt| rt.on_cleanup(Box::new(f)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Effect, Memo, Signal};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn root_returns_the_closure_result() {
        assert_eq!(create_root(|_| 7), 7);
    }

    #[test]
    fn disposing_a_root_stops_its_computations() {
        let signal = Signal::new(1);
        let runs = Rc::new(Cell::new(0));

        let dispose = create_root(|dispose| {
            Effect::new({
                let signal = signal.clone();
                let runs = runs.clone();
                move || {
                    signal.get();
                    runs.set(runs.get() + 1);
                    Ok(())
                }
            })
            .unwrap();
            dispose
        });

        signal.set(2).unwrap();
        assert_eq!(runs.get(), 2);

        dispose.dispose();
        dispose.dispose();
        signal.set(3).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn disposal_inside_a_batch_is_deferred() {
        let signal = Signal::new(1);
        let runs = Rc::new(Cell::new(0));

        let dispose = create_root(|dispose| {
            Effect::new({
                let signal = signal.clone();
                let runs = runs.clone();
                move || {
                    signal.get();
                    runs.set(runs.get() + 1);
                    Ok(())
                }
            })
            .unwrap();
            dispose
        });

        freeze(|| {
            dispose.dispose();
            signal.set(2)
        })
        .unwrap();

        // The pass re-ran the effect before disposing it.
        assert_eq!(runs.get(), 2);
        signal.set(3).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn freeze_applies_writes_together() {
        let a = Signal::new(1);
        let b = Signal::new(1);
        let sums = Rc::new(RefCell::new(Vec::new()));

        Effect::new({
            let (a, b, sums) = (a.clone(), b.clone(), sums.clone());
            move || {
                sums.borrow_mut().push(a.get() + b.get());
                Ok(())
            }
        })
        .unwrap();

        freeze(|| {
            a.set(10)?;
            b.set(20)
        })
        .unwrap();

        assert_eq!(*sums.borrow(), vec![2, 30]);
    }

    #[test]
    fn freeze_returns_the_closure_value() {
        let value = freeze(|| Ok(5)).unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn cleanups_without_an_owner_never_run() {
        let ran = Rc::new(Cell::new(false));
        on_cleanup({
            let ran = ran.clone();
            move |_| ran.set(true)
        });
        create_unowned_root(|| {
            let ran = ran.clone();
            on_cleanup(move |_| ran.set(true));
        });
        assert!(!ran.get());
    }

    #[test]
    fn unowned_children_outlive_their_creator() {
        let trigger = Signal::new(0);
        let inner_runs = Rc::new(Cell::new(0));

        let outer = Memo::new({
            let trigger = trigger.clone();
            let inner_runs = inner_runs.clone();
            move || {
                create_unowned_root(|| {
                    Effect::new({
                        let trigger = trigger.clone();
                        let inner_runs = inner_runs.clone();
                        move || {
                            trigger.get();
                            inner_runs.set(inner_runs.get() + 1);
                            Ok(())
                        }
                    })
                })?;
                Ok(())
            }
        })
        .unwrap();

        assert!(!outer.is_live());
        trigger.set(1).unwrap();
        assert_eq!(inner_runs.get(), 2);
    }
}
