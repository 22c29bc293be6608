//! Dependent Computations
//!
//! `on` builds a computation whose dependencies are declared up front instead
//! of discovered from its body. The declared dependencies are read with
//! tracking on every run; the body itself runs untracked, so whatever it
//! reads never causes a re-run.
//!
//! Anything implementing [`Track`] can serve as the declaration: a single
//! handle, a tuple, array, slice or `Vec` of handles, `()` for none, or a
//! closure wrapped with [`track_fn`].

use std::mem;

use super::effect::Effect;
use super::memo::Memo;
use super::root::sample;
use super::signal::Signal;
use super::value::ValueSignal;
use crate::error::Result;

/// A declared dependency: reading it registers the running computation as a
/// reader.
pub trait Track {
    fn track(&self) -> Result<()>;
}

impl<T: 'static> Track for Signal<T> {
    fn track(&self) -> Result<()> {
        self.register_read();
        Ok(())
    }
}

impl<T: Clone + 'static> Track for ValueSignal<T> {
    fn track(&self) -> Result<()> {
        self.signal().register_read();
        Ok(())
    }
}

impl<T: 'static> Track for Memo<T> {
    fn track(&self) -> Result<()> {
        self.register_read()
    }
}

impl Track for () {
    fn track(&self) -> Result<()> {
        Ok(())
    }
}

impl<D: Track + ?Sized> Track for &D {
    fn track(&self) -> Result<()> {
        (**self).track()
    }
}

impl<D: Track> Track for [D] {
    fn track(&self) -> Result<()> {
        self.iter().try_for_each(Track::track)
    }
}

impl<D: Track, const N: usize> Track for [D; N] {
    fn track(&self) -> Result<()> {
        self.as_slice().track()
    }
}

impl<D: Track> Track for Vec<D> {
    fn track(&self) -> Result<()> {
        self.as_slice().track()
    }
}

macro_rules! impl_track_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Track),+> Track for ($($name,)+) {
            #[allow(non_snake_case)]
            fn track(&self) -> Result<()> {
                let ($($name,)+) = self;
                $($name.track()?;)+
                Ok(())
            }
        }
    };
}

impl_track_for_tuple!(A);
impl_track_for_tuple!(A, B);
impl_track_for_tuple!(A, B, C);
impl_track_for_tuple!(A, B, C, D);
impl_track_for_tuple!(A, B, C, D, E);
impl_track_for_tuple!(A, B, C, D, E, F);

/// A closure used as a dependency declaration. See [`track_fn`].
pub struct TrackFn<F>(F);

/// Declare dependencies by running `f` with tracking on.
pub fn track_fn<F>(f: F) -> TrackFn<F>
where
    F: Fn() -> Result<()>,
{
    TrackFn(f)
}

impl<F> Track for TrackFn<F>
where
    F: Fn() -> Result<()>,
{
    fn track(&self) -> Result<()> {
        (self.0)()
    }
}

impl<T: Clone + 'static> Memo<T> {
    /// A reducing memo that re-runs `f` only when `deps` change.
    ///
    /// ```rust
    /// use cascade_core::{Memo, Signal};
    ///
    /// let d = Signal::new(1);
    /// let total = Memo::on(d.clone(), 0, {
    ///     let d = d.clone();
    ///     move |total| Ok(total + d.get())
    /// })?;
    ///
    /// d.set(2)?;
    /// assert_eq!(total.get()?, 3);
    /// # Ok::<(), cascade_core::Error>(())
    /// ```
    pub fn on<D, F>(deps: D, seed: T, f: F) -> Result<Self>
    where
        D: Track + 'static,
        F: FnMut(T) -> Result<T> + 'static,
    {
        dependent(deps, seed, false, f)
    }

    /// Like [`Memo::on`], but skips `f` on creation: the memo starts out as
    /// `seed` and `f` first runs on the first change of `deps`.
    pub fn on_changes<D, F>(deps: D, seed: T, f: F) -> Result<Self>
    where
        D: Track + 'static,
        F: FnMut(T) -> Result<T> + 'static,
    {
        dependent(deps, seed, true, f)
    }
}

impl Effect {
    /// An effect that runs `f` whenever `deps` change.
    pub fn on<D, F>(deps: D, mut f: F) -> Result<Self>
    where
        D: Track + 'static,
        F: FnMut() -> Result<()> + 'static,
    {
        dependent(deps, (), false, move |()| f()).map(Self::from_memo)
    }

    /// Like [`Effect::on`], but `f` does not run on creation.
    pub fn on_changes<D, F>(deps: D, mut f: F) -> Result<Self>
    where
        D: Track + 'static,
        F: FnMut() -> Result<()> + 'static,
    {
        dependent(deps, (), true, move |()| f()).map(Self::from_memo)
    }
}

fn dependent<T, D, F>(deps: D, seed: T, defer: bool, mut f: F) -> Result<Memo<T>>
where
    T: Clone + 'static,
    D: Track + 'static,
    F: FnMut(T) -> Result<T> + 'static,
{
    let mut waiting = defer;
    Memo::with_seed(seed, move |value| {
        deps.track()?;
        if mem::take(&mut waiting) {
            Ok(value)
        } else {
            sample(|| f(value))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<usize>>, impl FnMut() -> Result<()> + 'static) {
        let count = Rc::new(Cell::new(0));
        let spy = {
            let count = count.clone();
            move || {
                count.set(count.get() + 1);
                Ok(())
            }
        };
        (count, spy)
    }

    #[test]
    fn registers_a_dependency() {
        let d = Signal::new(1);
        let (calls, spy) = counter();
        Effect::on(d.clone(), spy).unwrap();

        assert_eq!(calls.get(), 1);
        d.set(2).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn body_reads_are_not_dependencies() {
        let d = Signal::new(1);
        let e = Signal::new(2);
        let calls = Rc::new(Cell::new(0));

        Effect::on(d.clone(), {
            let (e, calls) = (e.clone(), calls.clone());
            move || {
                e.get();
                calls.set(calls.get() + 1);
                Ok(())
            }
        })
        .unwrap();

        e.set(3).unwrap();
        assert_eq!(calls.get(), 1);
        d.set(3).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn tuple_dependencies() {
        let d = Signal::new(1);
        let e = ValueSignal::new(2);
        let (calls, spy) = counter();
        Effect::on((d.clone(), e.clone()), spy).unwrap();

        d.set(2).unwrap();
        e.set(3).unwrap();
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn collection_dependencies() {
        let d = Signal::new(1);
        let e = Signal::new(2);
        let (calls, spy) = counter();
        Effect::on(vec![d.clone(), e.clone()], spy).unwrap();

        d.set(2).unwrap();
        e.set(3).unwrap();
        assert_eq!(calls.get(), 3);

        let (calls, spy) = counter();
        Effect::on([d.clone(), e.clone()], spy).unwrap();
        e.set(4).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn closure_dependencies() {
        let d = Signal::new(1);
        let m = Memo::new({
            let d = d.clone();
            move || Ok(d.get() * 10)
        })
        .unwrap();
        let (calls, spy) = counter();

        Effect::on(
            track_fn({
                let m = m.clone();
                move || m.get().map(drop)
            }),
            spy,
        )
        .unwrap();

        d.set(2).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn reducer_accumulates() {
        let d = Signal::new(1);
        let c = Memo::on(d.clone(), 0, {
            let d = d.clone();
            move |c| Ok(c + d.get())
        })
        .unwrap();

        assert_eq!(c.get().unwrap(), 1);
        d.set(2).unwrap();
        assert_eq!(c.get().unwrap(), 3);
        d.set(7).unwrap();
        assert_eq!(c.get().unwrap(), 10);
    }

    #[test]
    fn deferred_skips_the_first_run() {
        let d = Signal::new(1);
        let c = Memo::on_changes(d.clone(), 0, {
            let d = d.clone();
            move |_| Ok(d.get() * 2)
        })
        .unwrap();

        assert_eq!(c.get().unwrap(), 0);
        d.set(2).unwrap();
        assert_eq!(c.get().unwrap(), 4);
    }

    #[test]
    fn deferred_effect() {
        let d = Signal::new(1);
        let (calls, spy) = counter();
        let effect = Effect::on_changes(d.clone(), spy).unwrap();

        assert_eq!(calls.get(), 0);
        assert!(!effect.is_inert());
        d.set(2).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn no_dependencies_runs_once() {
        let (calls, spy) = counter();
        let effect = Effect::on((), spy).unwrap();
        assert_eq!(calls.get(), 1);
        assert!(effect.is_inert());
    }
}
