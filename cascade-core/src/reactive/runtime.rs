//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! effects. Each thread has one, holding the dependency graph, the logical
//! clock with its worklists, the ambient owner/listener context, and the
//! active [`Config`].
//!
//! # How It Works
//!
//! 1. A write to a signal that has readers stages the new value and queues the
//!    signal on the changes worklist. Outside a batch, the write then runs a
//!    full propagation before returning.
//!
//! 2. Each propagation pass:
//!    a. commits every staged value and marks its readers stale, walking
//!       through readers of readers and stamping each with the current time;
//!    b. re-runs the stale computations in the order they were marked;
//!    c. disposes roots whose disposal was requested mid-batch.
//!
//!    Writes made during a pass are staged for the next one, and passes repeat
//!    until no work is left.
//!
//! 3. A computation that reads a node stamped with the current time which has
//!    not re-run yet updates it first (lazy pull). Every computation therefore
//!    runs at most once per tick and only sees settled values.
//!
//! # Borrowing
//!
//! User code re-enters the runtime freely, so no `RefCell` borrow is held
//! while user code runs, and user closures (which may own signal handles) are
//! never dropped while the graph is borrowed.

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;

use serde::Serialize;

use super::context::{Context, Owner};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graph::{
    drain, BatchGuard, Cleanup, Clock, ComputationNode, DataNode, Graph, Node, NodeKey, NodeState,
    PendingChange, Runner,
};

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

/// Counters describing the calling thread's runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    /// Current logical time.
    pub time: u64,
    /// Nodes currently in the graph.
    pub live_nodes: usize,
    /// Arena slots ever allocated. Recycled nodes reuse freed slots, so this
    /// only grows when the graph outgrows its peak size.
    pub node_slots: usize,
}

/// The per-thread reactive runtime.
///
/// There is nothing to construct: every thread lazily gets its own runtime
/// the first time a signal or computation is created on it.
pub struct Runtime {
    graph: RefCell<Graph>,
    clock: Clock,
    context: Context,
    config: Cell<Config>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            graph: RefCell::new(Graph::new()),
            clock: Clock::new(),
            context: Context::default(),
            config: Cell::new(Config::default()),
        }
    }

    pub(crate) fn with<R>(f: impl FnOnce(&Runtime) -> R) -> R {
        RUNTIME.with(f)
    }

    /// Like [`with`](Self::with), but does nothing once the thread's runtime
    /// has been torn down.
    pub(crate) fn try_with(f: impl FnOnce(&Runtime)) {
        if RUNTIME.try_with(f).is_err() {
            tracing::trace!("runtime already destroyed");
        }
    }

    /// Snapshot of this thread's counters.
    pub fn stats() -> RuntimeStats {
        Self::with(|rt| {
            let graph = rt.graph.borrow();
            RuntimeStats {
                time: rt.clock.time(),
                live_nodes: graph.len(),
                node_slots: graph.slots(),
            }
        })
    }

    /// Install `config` for this thread.
    pub fn configure(config: Config) {
        Self::with(|rt| rt.config.set(config));
    }

    /// The configuration active on this thread.
    pub fn config() -> Config {
        Self::with(|rt| rt.config.get())
    }

    pub(crate) fn time(&self) -> u64 {
        self.clock.time()
    }

    pub(crate) fn is_batching(&self) -> bool {
        self.clock.is_running()
    }

    // ---- Signals ----

    pub(crate) fn create_data(&self) -> NodeKey {
        self.graph.borrow_mut().insert(Node::Data(DataNode::default()))
    }

    pub(crate) fn release_data(&self, key: NodeKey) {
        match self.graph.try_borrow_mut() {
            Ok(mut graph) => {
                graph.remove(key);
            }
            Err(_) => tracing::warn!(?key, "signal dropped while the graph was busy; slot leaked"),
        }
    }

    /// Record a read of `producer` by the active listener, if any.
    pub(crate) fn track(&self, producer: NodeKey) {
        if let Some(listener) = self.context.listener() {
            if self.graph.borrow_mut().link(producer, listener) {
                tracing::trace!(?producer, ?listener, "recorded read");
            }
        }
    }

    pub(crate) fn has_readers(&self, key: NodeKey) -> bool {
        self.graph.borrow().has_readers(key)
    }

    pub(crate) fn stage(&self, change: Rc<dyn PendingChange>) {
        self.clock.changes.borrow_mut().add(change);
    }

    /// Apply a write made outside any batch to a signal without readers.
    pub(crate) fn tick(&self) {
        self.clock.tick();
    }

    /// Propagate the staged changes of a write made outside any batch.
    pub(crate) fn event(&self) -> Result<()> {
        self.clock.updates.borrow_mut().reset();
        self.clock.tick();
        self.run().inspect_err(|_| self.abandon())
    }

    // ---- Batching ----

    pub(crate) fn freeze<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        if self.clock.is_running() {
            return f();
        }
        let _batch = self.open_batch();
        let result = f().and_then(|value| self.event().map(|()| value));
        if result.is_err() {
            self.abandon();
        }
        result
    }

    pub(crate) fn sample<R>(&self, f: impl FnOnce() -> R) -> R {
        let _untracked = self.context.untracked();
        f()
    }

    fn open_batch(&self) -> BatchGuard<'_> {
        let batch = self.clock.enter();
        self.clock.discard_changes();
        self.clock.updates.borrow_mut().reset();
        batch
    }

    /// Run passes until every worklist is empty.
    fn run(&self) -> Result<()> {
        let _batch = self.clock.enter();
        let max_iterations = self.config.get().max_iterations;
        let mut iterations = 0;

        while self.clock.has_work() {
            if iterations > 0 {
                self.clock.tick();
            }
            tracing::trace!(time = self.clock.time(), iterations, "propagation pass");

            drain(&self.clock.changes, |change| {
                self.apply_change(&*change);
                Ok(())
            })?;
            drain(&self.clock.updates, |key| self.update_node(key))?;
            drain(&self.clock.disposes, |key| {
                self.dispose_node(key);
                Ok(())
            })?;

            iterations += 1;
            if iterations > max_iterations {
                return Err(Error::Runaway { iterations });
            }
        }
        Ok(())
    }

    /// Drop everything an aborted batch left behind.
    fn abandon(&self) {
        let dropped = self.clock.abandon();
        if dropped > 0 {
            tracing::warn!(dropped, "propagation failed; abandoning unfinished work");
        }
    }

    fn apply_change(&self, change: &dyn PendingChange) {
        let key = change.commit();
        self.mark_stale(key);
    }

    /// Queue every computation downstream of `producer`.
    ///
    /// Readers are visited depth-first, first slot first, and a node already
    /// stamped with the current time is skipped along with its readers. Owned
    /// children of a marked node are stamped current instead of stale: they
    /// are about to be disposed when their owner re-runs.
    fn mark_stale(&self, producer: NodeKey) {
        let time = self.clock.time();
        let mut graph = self.graph.borrow_mut();
        let mut updates = self.clock.updates.borrow_mut();

        let mut pending: Vec<NodeKey> = graph.readers(producer).collect();
        pending.reverse();
        let mut owned = Vec::new();

        while let Some(key) = pending.pop() {
            let Some(node) = graph.computation_mut(key) else {
                continue;
            };
            if node.is_disposed() || node.age >= time {
                continue;
            }
            node.age = time;
            node.state = NodeState::Stale;
            updates.add(key);
            owned.extend_from_slice(&node.owned);

            mark_owned_current(&mut graph, &mut owned, time);

            let start = pending.len();
            pending.extend(graph.readers(key));
            pending[start..].reverse();
        }
    }

    // ---- Computations ----

    /// Create a computation, evaluate it once, and attach it to the graph.
    ///
    /// `first` produces the initial value and `next` every later one from
    /// the previous value; both get the same `f`. Returns the node key, or
    /// `None` when the node read nothing and was recycled, along with the
    /// shared value cell.
    pub(crate) fn create_computation<T, F>(
        &self,
        mut f: F,
        first: impl FnOnce(&mut F) -> Result<T>,
        next: fn(&mut F, &T) -> Result<T>,
    ) -> Result<(Option<NodeKey>, Rc<RefCell<T>>)>
    where
        T: 'static,
        F: 'static,
    {
        if self.context.owner().is_none() && self.config.get().warn_unowned {
            tracing::warn!("computations created without a root or parent will never be disposed");
        }

        let key = self
            .graph
            .borrow_mut()
            .insert(Node::Computation(ComputationNode::new()));
        let toplevel = !self.clock.is_running();

        let value = {
            let _batch = toplevel.then(|| self.open_batch());
            let _scope = self.context.enter(Some(Owner::Node(key)), Some(key));
            first(&mut f)
        };
        let value = match value {
            Ok(value) => value,
            Err(err) => {
                self.dispose_node(key);
                if toplevel {
                    self.abandon();
                }
                return Err(err);
            }
        };

        let cell = Rc::new(RefCell::new(value));
        let node = if self.recycle(key, false) {
            None
        } else {
            let value = Rc::clone(&cell);
            let runner: Runner = Box::new(move || {
                let updated = next(&mut f, &value.borrow())?;
                *value.borrow_mut() = updated;
                Ok(())
            });
            self.claim(key, Some(runner), false);
            Some(key)
        };

        if toplevel && self.clock.has_work() {
            self.clock.tick();
            self.run().inspect_err(|_| self.abandon())?;
        }
        Ok((node, cell))
    }

    /// Register a read of computation `key`, updating it first if it was
    /// marked stale at the current time.
    pub(crate) fn read_computation(&self, key: NodeKey) -> Result<()> {
        let Some(listener) = self.context.listener() else {
            return Ok(());
        };
        let (age, state) = match self.graph.borrow().computation(key) {
            Some(node) if !node.is_disposed() => (node.age, node.state),
            _ => return Ok(()),
        };
        if age == self.clock.time() {
            if state == NodeState::Running {
                return Err(Error::CircularDependency);
            }
            self.update_node(key)?;
        }
        if self.graph.borrow_mut().link(key, listener) {
            tracing::trace!(producer = ?key, ?listener, "recorded read");
        }
        Ok(())
    }

    pub(crate) fn is_live(&self, key: NodeKey) -> bool {
        self.graph.borrow().is_live_computation(key)
    }

    /// Re-run a stale computation. Anything else is left alone.
    fn update_node(&self, key: NodeKey) -> Result<()> {
        let (cleanups, owned) = {
            let mut graph = self.graph.borrow_mut();
            let Some(node) = graph.computation_mut(key) else {
                return Ok(());
            };
            if node.state != NodeState::Stale {
                return Ok(());
            }
            node.state = NodeState::Running;
            (mem::take(&mut node.cleanups), mem::take(&mut node.owned))
        };
        self.teardown(key, cleanups, owned, false);

        let run = self
            .graph
            .borrow_mut()
            .computation_mut(key)
            .and_then(|node| node.run.take());
        let result = match run {
            Some(run) => {
                let mut run = RunnerGuard {
                    runtime: self,
                    key,
                    run: Some(run),
                };
                let _scope = self.context.enter(Some(Owner::Node(key)), Some(key));
                run.call()
            }
            None => Ok(()),
        };

        if result.is_ok() {
            if let Some(node) = self.graph.borrow_mut().computation_mut(key) {
                node.state = NodeState::Current;
            }
        }
        result
    }

    /// Run cleanups, dispose owned children, and drop all source edges.
    fn teardown(&self, key: NodeKey, cleanups: Vec<Cleanup>, owned: Vec<NodeKey>, is_final: bool) {
        {
            let _untracked = self.context.untracked();
            for cleanup in cleanups {
                cleanup(is_final);
            }
        }
        for child in owned {
            self.dispose_node(child);
        }
        self.graph.borrow_mut().unlink_sources(key);
    }

    /// Tear a computation down and free its slot.
    ///
    /// Readers keep their edges to it; those dangle and are skipped when the
    /// readers next unlink their sources.
    pub(crate) fn dispose_node(&self, key: NodeKey) {
        let (run, cleanups, owned) = {
            let mut graph = self.graph.borrow_mut();
            let Some(node) = graph.computation_mut(key) else {
                return;
            };
            if node.is_disposed() {
                return;
            }
            node.state = NodeState::Disposed;
            node.log.clear();
            (
                node.run.take(),
                mem::take(&mut node.cleanups),
                mem::take(&mut node.owned),
            )
        };
        drop(run);
        self.teardown(key, cleanups, owned, true);
        self.graph.borrow_mut().remove(key);
        tracing::debug!(?key, "disposed computation");
    }

    /// The owner a node created now would attach to.
    fn live_owner(&self, graph: &Graph, orphan: bool) -> Option<NodeKey> {
        match self.context.owner() {
            Some(Owner::Node(owner)) if !orphan && graph.is_live_computation(owner) => Some(owner),
            _ => None,
        }
    }

    /// Free a freshly evaluated node that read nothing.
    ///
    /// Its owned children and cleanups move to the active owner. A node that
    /// has some but no owner to hand them to is kept. Returns whether the node
    /// left the graph.
    fn recycle(&self, key: NodeKey, orphan: bool) -> bool {
        let mut graph = self.graph.borrow_mut();
        let owner = self.live_owner(&graph, orphan);
        let Some(node) = graph.computation(key) else {
            return true;
        };
        let bare = node.owned.is_empty() && node.cleanups.is_empty();
        if !node.sources.is_empty() || (!bare && owner.is_none()) {
            return false;
        }

        let Some(Node::Computation(node)) = graph.remove(key) else {
            return true;
        };
        if let Some(parent) = owner.and_then(|owner| graph.computation_mut(owner)) {
            parent.owned.extend(node.owned);
            parent.cleanups.extend(node.cleanups);
        }
        tracing::debug!(?key, "recycled computation");
        true
    }

    /// Keep a freshly evaluated node: install its runner and attach it to the
    /// active owner.
    fn claim(&self, key: NodeKey, run: Option<Runner>, orphan: bool) {
        let time = self.clock.time();
        let mut graph = self.graph.borrow_mut();
        let owner = self.live_owner(&graph, orphan);

        let rejected = match graph.computation_mut(key) {
            Some(node) => {
                node.run = run;
                node.age = time;
                if let Some(parent) = owner.and_then(|owner| graph.computation_mut(owner)) {
                    parent.owned.push(key);
                }
                None
            }
            None => run,
        };
        drop(graph);
        drop(rejected);
    }

    // ---- Ownership ----

    pub(crate) fn create_root<R>(&self, f: impl FnOnce(NodeKey) -> R) -> R {
        let key = self
            .graph
            .borrow_mut()
            .insert(Node::Computation(ComputationNode::new()));
        let result = {
            let _scope = self.context.enter_owner(Some(Owner::Node(key)));
            f(key)
        };
        if !self.recycle(key, true) {
            self.claim(key, None, true);
        }
        result
    }

    pub(crate) fn create_unowned<R>(&self, f: impl FnOnce() -> R) -> R {
        let _scope = self.context.enter_owner(Some(Owner::Unowned));
        f()
    }

    /// Dispose a root now, or after the current pass if a batch is running.
    pub(crate) fn dispose_root(&self, key: NodeKey) {
        if self.clock.is_running() {
            self.clock.disposes.borrow_mut().add(key);
        } else {
            self.dispose_node(key);
        }
    }

    pub(crate) fn on_cleanup(&self, cleanup: Cleanup) {
        let Some(Owner::Node(owner)) = self.context.owner() else {
            if self.config.get().warn_unowned {
                tracing::warn!("cleanups created without a root or parent will never be run");
            }
            return;
        };
        let rejected = match self.graph.borrow_mut().computation_mut(owner) {
            Some(node) if !node.is_disposed() => {
                node.cleanups.push(cleanup);
                None
            }
            _ => Some(cleanup),
        };
        drop(rejected);
    }
}

/// Holds a runner taken off its node and puts it back on drop, also when the
/// run panics. A node disposed in the meantime gets nothing back.
struct RunnerGuard<'a> {
    runtime: &'a Runtime,
    key: NodeKey,
    run: Option<Runner>,
}

impl RunnerGuard<'_> {
    fn call(&mut self) -> Result<()> {
        match self.run.as_mut() {
            Some(run) => run(),
            None => Ok(()),
        }
    }
}

impl Drop for RunnerGuard<'_> {
    fn drop(&mut self) {
        let run = self.run.take();
        let orphaned = match self.runtime.graph.try_borrow_mut() {
            Ok(mut graph) => match graph.computation_mut(self.key) {
                Some(node) => {
                    node.run = run;
                    None
                }
                None => run,
            },
            Err(_) => run,
        };
        drop(orphaned);
    }
}

fn mark_owned_current(graph: &mut Graph, stack: &mut Vec<NodeKey>, time: u64) {
    while let Some(key) = stack.pop() {
        if let Some(node) = graph.computation_mut(key) {
            if node.is_disposed() {
                continue;
            }
            node.age = time;
            node.state = NodeState::Current;
            stack.extend_from_slice(&node.owned);
        }
    }
}

// ---- Tests ----
