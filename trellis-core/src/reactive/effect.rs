//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs when its dependencies
//! change. Unlike memos, effects don't produce values. They perform
//! actions like updating the DOM, logging, or making network requests.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs immediately to establish dependencies.
//!
//! 2. When any dependency changes, the runtime queues the effect and re-runs
//!    it once the current write (or batch) is done.
//!
//! 3. Effects are leaves in the dependency graph: nothing depends on them.
//!
//! # Ownership
//!
//! The runtime keeps every effect alive until [`Effect::dispose`] is called,
//! either directly or through the [`Scope`](super::Scope) the effect was
//! created in. Dropping the handle does not stop the effect.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use tracing::trace;

use super::runtime::{Reactive, Runtime};
use super::scope;
use crate::graph::NodeId;

type EffectFn = Box<dyn FnMut()>;

struct EffectInner {
    id: NodeId,
    /// Taken out on dispose, releasing everything the closure captured.
    run: RefCell<Option<EffectFn>>,
    run_count: Cell<usize>,
    disposed: Cell<bool>,
}

impl Reactive for EffectInner {
    fn recompute(&self) -> bool {
        if self.disposed.get() {
            return false;
        }

        let Ok(mut slot) = self.run.try_borrow_mut() else {
            trace!(effect = self.id.raw(), "effect re-entered while running, skipped");
            return false;
        };
        let Some(run) = slot.as_mut() else {
            return false;
        };

        self.run_count.set(self.run_count.get() + 1);
        Runtime::run_tracked(self.id, || run());
        false
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{Effect, Signal};
///
/// let count = Signal::new(0);
/// let reader = count.clone();
/// let effect = Effect::new(move || {
///     println!("count is {}", reader.get());
/// });
///
/// count.set(1); // prints "count is 1"
/// assert_eq!(effect.run_count(), 2);
///
/// effect.dispose();
/// count.set(2); // nothing
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Create a new effect and run it immediately.
    pub fn new(f: impl FnMut() + 'static) -> Self {
        let effect = Self::new_lazy(f);
        if !effect.is_disposed() {
            effect.execute();
        }
        effect
    }

    /// Create an effect without running it.
    ///
    /// The effect has no dependencies until it first runs through
    /// [`Effect::execute`] or [`Effect::schedule`].
    pub fn new_lazy(f: impl FnMut() + 'static) -> Self {
        let id = NodeId::new();
        let inner = Rc::new(EffectInner {
            id,
            run: RefCell::new(Some(Box::new(f))),
            run_count: Cell::new(0),
            disposed: Cell::new(false),
        });
        Runtime::register_effect(id, inner.clone());

        let effect = Self { inner };
        if !scope::adopt(&effect) {
            trace!(effect = id.raw(), "effect created in a disposed scope");
            effect.dispose();
        }
        effect
    }

    /// Run `f` once, tracking nothing afterwards.
    pub fn once(f: impl FnOnce() + 'static) -> Self {
        let mut f = Some(f);
        let effect = Self::new_lazy(move || {
            if let Some(f) = f.take() {
                f();
            }
        });
        if !effect.is_disposed() {
            effect.execute();
            effect.dispose();
        }
        effect
    }

    /// Get the effect's node ID.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Run the effect now, re-collecting its dependencies.
    pub fn execute(&self) {
        if self.is_disposed() {
            return;
        }
        Runtime::run_effect(self.inner.id);
    }

    /// Queue the effect for the next flush.
    ///
    /// Outside of a batch or a running flush this runs it right away.
    pub fn schedule(&self) {
        if self.is_disposed() {
            return;
        }
        Runtime::schedule(self.inner.id);
    }

    /// Stop the effect permanently.
    ///
    /// The effect is removed from the graph and its closure is dropped.
    /// Disposing twice is a no-op.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        trace!(effect = self.inner.id.raw(), "effect disposed");

        let released = self
            .inner
            .run
            .try_borrow_mut()
            .ok()
            .and_then(|mut slot| slot.take());
        Runtime::unregister(self.inner.id);
        drop(released);
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Number of nodes the effect read during its last run.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.inner.id)
    }
}

impl Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Run `f` once inside an effect, then dispose it.
pub fn effect_once(f: impl FnOnce() + 'static) -> Effect {
    Effect::once(f)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
