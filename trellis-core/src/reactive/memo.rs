//! Memos
//!
//! Lazily computed, cached derivations. A memo does no work until read, and
//! a write upstream only colors it stale. The next read settles it:
//!
//! - clean: the cached value is returned as is;
//! - maybe dirty: the memos it reads are settled first, and if none of them
//!   produced a new value it is marked clean without running;
//! - dirty: the computation reruns and its reads are re-recorded.
//!
//! A rerun that yields a value equal to the cached one (by the memo's
//! comparator) leaves its readers untouched.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use super::runtime::{Reactive, Runtime};
use crate::graph::{DirtyState, NodeId};

type Compute<T> = Box<dyn Fn() -> T>;
type Equality<T> = Box<dyn Fn(&T, &T) -> bool>;

struct MemoInner<T> {
    id: NodeId,
    compute: Compute<T>,
    equal: Equality<T>,
    /// `None` until the first computation.
    value: RefCell<Option<T>>,
}

impl<T: 'static> Reactive for MemoInner<T> {
    fn recompute(&self) -> bool {
        let next = Runtime::run_tracked(self.id, || (self.compute)());

        let mut slot = self.value.borrow_mut();
        let changed = match slot.as_ref() {
            Some(previous) => !(self.equal)(previous, &next),
            None => true,
        };
        *slot = Some(next);
        changed
    }
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        Runtime::unregister(self.id);
    }
}

/// A cached, lazily recomputed derivation.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{Memo, Signal};
///
/// let count = Signal::new(2);
/// let source = count.clone();
/// let doubled = Memo::new(move || source.get() * 2);
///
/// assert_eq!(doubled.get(), 4);
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Memo<T: 'static> {
    inner: Rc<MemoInner<T>>,
}

impl<T: PartialEq + 'static> Memo<T> {
    /// Nothing runs until the first read.
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        Self::with_eq(compute, <T as PartialEq>::eq)
    }
}

impl<T: 'static> Memo<T> {
    /// Like [`Memo::new`], comparing outputs with `equal` instead of `==`.
    ///
    /// Passing `|_, _| false` makes every recomputation count as a change.
    pub fn with_eq(
        compute: impl Fn() -> T + 'static,
        equal: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        let id = NodeId::new();
        let inner = Rc::new(MemoInner {
            id,
            compute: Box::new(compute),
            equal: Box::new(equal),
            value: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let weak: Weak<dyn Reactive> = weak;
        Runtime::register_derived(id, weak);

        Self { inner }
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Borrow the current value, recomputing first if necessary.
    ///
    /// The cached value stays borrowed while `f` runs.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        // Settle before subscribing: a first computation must not wake the
        // reader that triggered it.
        Runtime::pull(self.inner.id);
        Runtime::track(self.inner.id);
        self.read_settled(f)
    }

    /// Like [`Memo::with`], without registering a dependency.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Runtime::pull(self.inner.id);
        self.read_settled(f)
    }

    fn read_settled<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.inner.value.borrow();
        f(value.as_ref().expect("memo value present after refresh"))
    }

    pub fn state(&self) -> DirtyState {
        Runtime::dirty_state(self.inner.id).unwrap_or(DirtyState::Dirty)
    }

    /// Whether the computation has run at least once.
    pub fn has_value(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    pub fn dependent_count(&self) -> usize {
        Runtime::dependent_count(self.inner.id)
    }
}

impl<T: Clone + 'static> Memo<T> {
    /// Clone out the settled value, subscribing the running computation.
    ///
    /// This is the main entry point for reading a memo's value.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the current value without tracking the read.
    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }
}

impl<T: 'static> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("has_value", &self.has_value())
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
