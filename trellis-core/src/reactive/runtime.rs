//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! effects. It owns the dependency graph and schedules updates when signals
//! change.
//!
//! # How It Works
//!
//! 1. Signals, memos and effects register a node with the runtime when they
//!    are created, and unregister it when they are dropped or disposed.
//!
//! 2. When a memo or effect runs, the runtime records every node it read and
//!    replaces the computation's edges in the graph.
//!
//! 3. When a signal's value changes, the runtime:
//!    a. Marks direct dependents dirty and everything downstream maybe dirty
//!    b. Queues the affected effects in topological order
//!    c. Flushes the queue, unless a flush or a batch is already running
//!    d. Memos are lazy - they recompute when an effect (or a read) pulls them
//!
//! # Threading
//!
//! All state is thread-local. Rendering is single-threaded and cooperative,
//! so reactive values are `Rc` based and never cross threads.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::{Rc, Weak};

use tracing::trace;

use super::context::ReactiveContext;
use crate::graph::{DirtyState, Node, NodeId, NodeKind, UpdateScheduler};

/// A computation the runtime can re-run: a memo or an effect.
pub(crate) trait Reactive {
    /// Re-run the computation. Returns true when its observable output changed.
    fn recompute(&self) -> bool;
}

/// How the runtime holds on to a computation.
enum Slot {
    /// Effects are owned by the runtime until disposed.
    Owned(Rc<dyn Reactive>),
    /// Memos live as long as their handles do.
    Observed(Weak<dyn Reactive>),
}

impl Slot {
    fn upgrade(&self) -> Option<Rc<dyn Reactive>> {
        match self {
            Slot::Owned(reactive) => Some(Rc::clone(reactive)),
            Slot::Observed(weak) => weak.upgrade(),
        }
    }
}

/// Effects waiting for the next flush, first queued first run.
///
/// An id is queued at most once. Removed ids stay in `order` and are skipped
/// when popped.
#[derive(Default)]
struct EffectQueue {
    order: VecDeque<NodeId>,
    pending: HashSet<NodeId>,
}

impl EffectQueue {
    fn push(&mut self, id: NodeId) {
        if self.pending.insert(id) {
            self.order.push_back(id);
        }
    }

    fn remove(&mut self, id: NodeId) {
        self.pending.remove(&id);
    }

    fn pop(&mut self) -> Option<NodeId> {
        while let Some(id) = self.order.pop_front() {
            if self.pending.remove(&id) {
                return Some(id);
            }
        }
        None
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}

impl Extend<NodeId> for EffectQueue {
    fn extend<I: IntoIterator<Item = NodeId>>(&mut self, ids: I) {
        for id in ids {
            self.push(id);
        }
    }
}

#[derive(Default)]
struct RuntimeState {
    graph: RefCell<UpdateScheduler>,
    computations: RefCell<HashMap<NodeId, Slot>>,
    queue: RefCell<EffectQueue>,
    flushing: Cell<bool>,
    batch_depth: Cell<usize>,
}

thread_local! {
    static STATE: RuntimeState = RuntimeState::default();
}

/// Resets the flushing flag even if an effect panics mid-flush.
struct FlushGuard;

impl FlushGuard {
    fn acquire() -> Option<Self> {
        STATE.with(|state| {
            if state.flushing.replace(true) {
                None
            } else {
                Some(FlushGuard)
            }
        })
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let _ = STATE.try_with(|state| state.flushing.set(false));
    }
}

/// The thread-local reactive runtime.
pub struct Runtime;

impl Runtime {
    /// Register a signal's node.
    pub(crate) fn register_source(id: NodeId) {
        STATE.with(|state| {
            state
                .graph
                .borrow_mut()
                .add_node(Node::new(id, NodeKind::Source));
        });
    }

    /// Register a memo, held weakly.
    pub(crate) fn register_derived(id: NodeId, reactive: Weak<dyn Reactive>) {
        STATE.with(|state| {
            state
                .graph
                .borrow_mut()
                .add_node(Node::new(id, NodeKind::Derived));
            state
                .computations
                .borrow_mut()
                .insert(id, Slot::Observed(reactive));
        });
    }

    /// Register an effect. The runtime keeps it alive until it is disposed.
    pub(crate) fn register_effect(id: NodeId, reactive: Rc<dyn Reactive>) {
        STATE.with(|state| {
            state
                .graph
                .borrow_mut()
                .add_node(Node::new(id, NodeKind::Effect));
            state
                .computations
                .borrow_mut()
                .insert(id, Slot::Owned(reactive));
        });
    }

    /// Remove a node and everything the runtime holds for it.
    pub(crate) fn unregister(id: NodeId) {
        let _ = STATE.try_with(|state| {
            if let Ok(mut graph) = state.graph.try_borrow_mut() {
                graph.remove_node(id);
            }
            if let Ok(mut queue) = state.queue.try_borrow_mut() {
                queue.remove(id);
            }
            // Dropped outside the borrow: an owned effect may release memos
            // and signals that unregister themselves in turn.
            let removed = state
                .computations
                .try_borrow_mut()
                .ok()
                .and_then(|mut computations| computations.remove(&id));
            drop(removed);
        });
    }

    /// Record a read of `id` by the running computation, if any.
    ///
    /// The edge is added right away so that a write later in the same run
    /// already reaches the reader. `run_tracked` prunes stale edges at the end.
    pub(crate) fn track(id: NodeId) {
        let Some(subscriber) = ReactiveContext::current_subscriber() else {
            return;
        };
        if subscriber == id {
            return;
        }
        ReactiveContext::track_dependency(id);
        STATE.with(|state| state.graph.borrow_mut().add_edge(id, subscriber));
    }

    /// Run a computation while collecting its reads, then rewire its edges.
    pub(crate) fn run_tracked<R>(id: NodeId, f: impl FnOnce() -> R) -> R {
        // Clean before running: a write performed by the computation itself
        // must be able to dirty it again.
        STATE.with(|state| state.graph.borrow_mut().mark_clean(id));

        let context = ReactiveContext::enter(id);
        let result = f();
        let dependencies = ReactiveContext::take_dependencies();
        drop(context);

        STATE.with(|state| {
            state
                .graph
                .borrow_mut()
                .replace_dependencies(id, dependencies);
        });

        result
    }

    /// Current dirty state of a node, `None` once it left the graph.
    pub fn dirty_state(id: NodeId) -> Option<DirtyState> {
        STATE.with(|state| state.graph.borrow().dirty_state(id))
    }

    /// Bring a computation up to date, recomputing only if one of its inputs
    /// actually changed.
    ///
    /// Derived inputs are refreshed before the computation runs, so reading
    /// them during the run never wakes the computation a second time.
    pub(crate) fn refresh(id: NodeId) {
        match Self::dirty_state(id) {
            None | Some(DirtyState::Clean) => return,
            Some(_) => {}
        }

        let dependencies = STATE.with(|state| state.graph.borrow().dependencies_of(id));
        for dependency in dependencies {
            let kind = STATE.with(|state| state.graph.borrow().kind(dependency));
            if kind == Some(NodeKind::Derived) {
                Self::refresh(dependency);
            }
        }

        let dirty = Self::dirty_state(id);
        if dirty == Some(DirtyState::Dirty) {
            let reactive = STATE.with(|state| {
                state
                    .computations
                    .borrow()
                    .get(&id)
                    .and_then(Slot::upgrade)
            });

            if let Some(reactive) = reactive {
                if reactive.recompute() {
                    let woken =
                        STATE.with(|state| state.graph.borrow_mut().mark_dependents_dirty(id));
                    Self::enqueue(woken);
                }
                return;
            }
        }

        STATE.with(|state| state.graph.borrow_mut().mark_clean(id));
    }

    /// Refresh a memo on read. Effects woken by the refresh run right away
    /// unless a flush or batch is already in progress.
    pub(crate) fn pull(id: NodeId) {
        if Self::dirty_state(id) == Some(DirtyState::Clean) {
            return;
        }
        Self::refresh(id);
        Self::flush_if_idle();
    }

    /// Notify the runtime that a signal's value changed.
    ///
    /// This is the core update propagation mechanism.
    pub(crate) fn notify_signal_change(id: NodeId) {
        let effects: Vec<NodeId> = STATE.with(|state| {
            let mut graph = state.graph.borrow_mut();
            let affected = graph.mark_changed(id);
            affected
                .into_iter()
                .filter(|node| graph.kind(*node) == Some(NodeKind::Effect))
                .collect()
        });

        trace!(signal = id.raw(), effects = effects.len(), "signal changed");
        Self::enqueue(effects);
        Self::flush_if_idle();
    }

    /// Force an effect to run now (or as part of the running flush).
    pub(crate) fn run_effect(id: NodeId) {
        STATE.with(|state| state.graph.borrow_mut().mark_dirty(id));
        match FlushGuard::acquire() {
            Some(guard) => {
                Self::refresh(id);
                if Self::batch_depth() == 0 {
                    Self::drain();
                }
                drop(guard);
            }
            None => Self::refresh(id),
        }
    }

    /// Queue an effect for the next flush.
    pub(crate) fn schedule(id: NodeId) {
        STATE.with(|state| state.graph.borrow_mut().mark_dirty(id));
        Self::enqueue([id]);
        Self::flush_if_idle();
    }

    fn enqueue(ids: impl IntoIterator<Item = NodeId>) {
        STATE.with(|state| state.queue.borrow_mut().extend(ids));
    }

    fn batch_depth() -> usize {
        STATE.with(|state| state.batch_depth.get())
    }

    fn flush_if_idle() {
        if Self::batch_depth() > 0 {
            return;
        }
        if let Some(guard) = FlushGuard::acquire() {
            Self::drain();
            drop(guard);
        }
    }

    fn drain() {
        let queued = STATE.with(|state| state.queue.borrow().len());
        if queued > 0 {
            trace!(queued, "flushing effects");
        }
        loop {
            let next = STATE.with(|state| state.queue.borrow_mut().pop());
            match next {
                Some(id) => Self::refresh(id),
                None => break,
            }
        }
    }

    /// Run `f`, deferring effect execution until it returns.
    ///
    /// Nested batches flush once, when the outermost one finishes.
    pub fn batch<R>(f: impl FnOnce() -> R) -> R {
        STATE.with(|state| state.batch_depth.set(state.batch_depth.get() + 1));
        let result = f();
        let depth = STATE.with(|state| {
            let depth = state.batch_depth.get().saturating_sub(1);
            state.batch_depth.set(depth);
            depth
        });
        if depth == 0 {
            Self::flush_if_idle();
        }
        result
    }

    /// Number of live nodes on this thread.
    pub fn node_count() -> usize {
        STATE.with(|state| state.graph.borrow().node_count())
    }

    /// Number of direct dependents of a node.
    pub fn dependent_count(id: NodeId) -> usize {
        STATE.with(|state| {
            state
                .graph
                .borrow()
                .get_node(id)
                .map(|node| node.dependents().len())
                .unwrap_or(0)
        })
    }

    /// Number of direct dependencies of a node.
    pub fn dependency_count(id: NodeId) -> usize {
        STATE.with(|state| state.graph.borrow().dependencies_of(id).len())
    }
}

/// Shorthand for [`Runtime::batch`].
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    Runtime::batch(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_queue_keeps_first_position_and_skips_removed() {
        let mut queue = EffectQueue::default();
        let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());

        queue.extend([a, b, a, c]);
        assert_eq!(queue.len(), 3);

        queue.remove(b);
        assert_eq!(queue.pop(), Some(a));
        assert_eq!(queue.pop(), Some(c));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn effect_queue_drains_many_entries_in_order() {
        let mut queue = EffectQueue::default();
        let ids: Vec<NodeId> = (0..10_000).map(|_| NodeId::new()).collect();
        queue.extend(ids.iter().copied());

        let drained: Vec<NodeId> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, ids);
        assert_eq!(queue.len(), 0);
    }

    struct MockReactive {
        recomputed: Cell<usize>,
        changed: bool,
    }

    impl MockReactive {
        fn new(changed: bool) -> Rc<Self> {
            Rc::new(Self {
                recomputed: Cell::new(0),
                changed,
            })
        }
    }

    impl Reactive for MockReactive {
        fn recompute(&self) -> bool {
            self.recomputed.set(self.recomputed.get() + 1);
            self.changed
        }
    }

    #[test]
    fn runtime_registers_and_unregisters() {
        let id = NodeId::new();
        let before = Runtime::node_count();

        Runtime::register_source(id);
        assert_eq!(Runtime::node_count(), before + 1);
        assert_eq!(Runtime::dirty_state(id), Some(DirtyState::Clean));

        Runtime::unregister(id);
        assert_eq!(Runtime::node_count(), before);
        assert_eq!(Runtime::dirty_state(id), None);
    }

    #[test]
    fn runtime_notifies_effects_but_not_memos() {
        let source = NodeId::new();
        let memo_id = NodeId::new();
        let effect_id = NodeId::new();

        let memo = MockReactive::new(false);
        let effect = MockReactive::new(false);
        let memo_dyn: Rc<dyn Reactive> = memo.clone();

        Runtime::register_source(source);
        Runtime::register_derived(memo_id, Rc::downgrade(&memo_dyn));
        Runtime::register_effect(effect_id, effect.clone());

        Runtime::run_tracked(memo_id, || Runtime::track(source));
        Runtime::run_tracked(effect_id, || Runtime::track(source));

        Runtime::notify_signal_change(source);

        // The effect is eager, the memo waits to be pulled
        assert_eq!(effect.recomputed.get(), 1);
        assert_eq!(memo.recomputed.get(), 0);
        assert_eq!(Runtime::dirty_state(memo_id), Some(DirtyState::Dirty));

        Runtime::unregister(effect_id);
        Runtime::unregister(memo_id);
        Runtime::unregister(source);
    }

    #[test]
    fn unchanged_memo_does_not_rerun_effect() {
        let source = NodeId::new();
        let memo_id = NodeId::new();
        let effect_id = NodeId::new();

        let memo = MockReactive::new(false);
        let effect = MockReactive::new(false);
        let memo_dyn: Rc<dyn Reactive> = memo.clone();

        Runtime::register_source(source);
        Runtime::register_derived(memo_id, Rc::downgrade(&memo_dyn));
        Runtime::register_effect(effect_id, effect.clone());

        Runtime::run_tracked(memo_id, || Runtime::track(source));
        Runtime::run_tracked(effect_id, || Runtime::track(memo_id));

        Runtime::notify_signal_change(source);

        // Memo was pulled, reported no change, so the effect stayed put
        assert_eq!(memo.recomputed.get(), 1);
        assert_eq!(effect.recomputed.get(), 0);
        assert_eq!(Runtime::dirty_state(effect_id), Some(DirtyState::Clean));

        Runtime::unregister(effect_id);
        Runtime::unregister(memo_id);
        Runtime::unregister(source);
    }

    #[test]
    fn batch_defers_flush() {
        let source = NodeId::new();
        let effect_id = NodeId::new();
        let effect = MockReactive::new(false);

        Runtime::register_source(source);
        Runtime::register_effect(effect_id, effect.clone());
        Runtime::run_tracked(effect_id, || Runtime::track(source));

        batch(|| {
            Runtime::notify_signal_change(source);
            Runtime::notify_signal_change(source);
            assert_eq!(effect.recomputed.get(), 0);
        });

        assert_eq!(effect.recomputed.get(), 1);

        Runtime::unregister(effect_id);
        Runtime::unregister(source);
    }
}
