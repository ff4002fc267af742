//! Read-only reactive values.
//!
//! `ReadSignal` erases where a value comes from. Signals, memos and plain
//! closures over reactive state all look the same to the rendering layer.

use std::fmt::Debug;
use std::rc::Rc;

use super::memo::Memo;
use super::signal::Signal;

/// A cloneable, tracked getter.
pub struct ReadSignal<T: 'static> {
    read: Rc<dyn Fn() -> T>,
}

impl<T: 'static> ReadSignal<T> {
    /// Wrap a getter. Reads it performs are tracked by the caller's context.
    pub fn new(read: impl Fn() -> T + 'static) -> Self {
        Self {
            read: Rc::new(read),
        }
    }

    /// A getter that always yields a clone of `value`.
    pub fn constant(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(move || value.clone())
    }

    /// Read the value, tracking whatever the getter reads.
    pub fn get(&self) -> T {
        (self.read)()
    }

    /// Read the value without tracking.
    pub fn get_untracked(&self) -> T {
        super::untrack(|| (self.read)())
    }

    /// Derive a new getter. The result is not cached; wrap it in a
    /// [`Memo`] when the mapping is expensive.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> ReadSignal<U> {
        let read = Rc::clone(&self.read);
        ReadSignal::new(move || f(read()))
    }
}

impl<T: 'static> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            read: Rc::clone(&self.read),
        }
    }
}

impl<T: 'static> Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSignal").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> From<Signal<T>> for ReadSignal<T> {
    fn from(signal: Signal<T>) -> Self {
        Self::new(move || signal.get())
    }
}

impl<T: Clone + 'static> From<&Signal<T>> for ReadSignal<T> {
    fn from(signal: &Signal<T>) -> Self {
        Self::from(signal.clone())
    }
}

impl<T: Clone + 'static> From<Memo<T>> for ReadSignal<T> {
    fn from(memo: Memo<T>) -> Self {
        Self::new(move || memo.get())
    }
}

impl<T: Clone + 'static> From<&Memo<T>> for ReadSignal<T> {
    fn from(memo: &Memo<T>) -> Self {
        Self::from(memo.clone())
    }
}
