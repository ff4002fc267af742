//! Signals
//!
//! Writable reactive state. A signal handle is a cheap `Rc` clone of the same
//! cell, and the cell's graph node is unregistered when the last handle goes.
//!
//! Writes propagate synchronously: by the time `set` returns, every effect
//! downstream has rerun, unless a [`batch`](super::batch) is open.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use super::runtime::Runtime;
use crate::graph::NodeId;

struct SignalInner<T> {
    id: NodeId,
    value: RefCell<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        Runtime::unregister(self.id);
    }
}

/// Writable reactive state of type `T`.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::Signal;
///
/// let count = Signal::new(0);
///
/// // Read the value
/// assert_eq!(count.get(), 0);
///
/// // Update the value (notifies dependents)
/// count.set(5);
/// count.update(|n| *n += 1);
/// assert_eq!(count.get(), 6);
/// ```
pub struct Signal<T: 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        let id = NodeId::new();
        Runtime::register_source(id);
        Self {
            inner: Rc::new(SignalInner {
                id,
                value: RefCell::new(value),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Borrow the current value, tracking the read.
    ///
    /// The value stays borrowed while `f` runs, so `f` must not write to this
    /// signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Runtime::track(self.inner.id);
        f(&self.inner.value.borrow())
    }

    /// Borrow the current value without tracking the read.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Mutate the value in place and notify dependents unconditionally.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        Runtime::notify_signal_change(self.inner.id);
    }

    /// Number of computations currently reading this signal.
    pub fn subscriber_count(&self) -> usize {
        Runtime::dependent_count(self.inner.id)
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Clone out the value, subscribing the running computation.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }
}

impl<T: PartialEq + 'static> Signal<T> {
    /// Replace the value. Writing an equal value is a no-op.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        Runtime::notify_signal_change(self.inner.id);
    }
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug + 'static> Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
