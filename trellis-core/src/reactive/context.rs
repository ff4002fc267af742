//! Tracking Context
//!
//! A thread-local stack of "who is reading right now". Running a memo or an
//! effect pushes an entry, every read lands in the topmost entry, and the
//! guard pops it again.
//!
//! An entry may have no subscriber. That is how [`untrack`] works: reads made
//! under it are dropped, but a memo or effect created inside it pushes its own
//! entry on top and tracks as usual.

use std::cell::RefCell;

use indexmap::IndexSet;

use crate::graph::NodeId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone)]
struct ContextEntry {
    /// The computation collecting reads, `None` while tracking is suspended.
    subscriber_id: Option<NodeId>,
    /// Nodes read during this computation, deduplicated, in read order.
    dependencies: IndexSet<NodeId>,
}

/// Pops its stack entry on drop, panics included.
pub struct ReactiveContext {
    subscriber_id: Option<NodeId>,
}

impl ReactiveContext {
    /// Start collecting reads for `subscriber_id`.
    pub fn enter(subscriber_id: NodeId) -> Self {
        Self::push(Some(subscriber_id))
    }

    fn push(subscriber_id: Option<NodeId>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber_id,
                dependencies: IndexSet::new(),
            });
        });

        Self { subscriber_id }
    }

    /// Whether a read right now would be recorded.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    pub fn current_subscriber() -> Option<NodeId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.subscriber_id))
    }

    /// Called on every signal and memo read. A computation never records
    /// itself.
    pub fn track_dependency(node_id: NodeId) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                if entry.subscriber_id.is_some() && entry.subscriber_id != Some(node_id) {
                    entry.dependencies.insert(node_id);
                }
            }
        });
    }

    /// Reads collected by the topmost entry so far, emptying it.
    pub fn take_dependencies() -> IndexSet<NodeId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow_mut()
                .last_mut()
                .map(|entry| std::mem::take(&mut entry.dependencies))
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // The stack may already be gone during thread teardown.
        let _ = CONTEXT_STACK.try_with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}

/// Guard that suspends dependency tracking until it is dropped.
///
/// Creating the guard is the "suspend" call and dropping it is the matching
/// "resume". Guards nest, but they are bound to the current thread and must be
/// dropped in reverse creation order.
#[must_use = "tracking resumes as soon as the suspension is dropped"]
pub struct TrackingSuspension {
    _context: ReactiveContext,
}

impl TrackingSuspension {
    pub fn new() -> Self {
        Self {
            _context: ReactiveContext::push(None),
        }
    }
}

impl Default for TrackingSuspension {
    fn default() -> Self {
        Self::new()
    }
}

/// Suspend dependency tracking for the current thread.
pub fn suspend_tracking() -> TrackingSuspension {
    TrackingSuspension::new()
}

/// Run `f` without recording any of its reads as dependencies of the
/// enclosing computation.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{untrack, Effect, Signal};
///
/// let a = Signal::new(1);
/// let b = Signal::new(10);
///
/// let (a2, b2) = (a.clone(), b.clone());
/// let effect = Effect::new(move || {
///     let _ = a2.get() + untrack(|| b2.get());
/// });
///
/// b.set(20);
/// assert_eq!(effect.run_count(), 1);
/// a.set(2);
/// assert_eq!(effect.run_count(), 2);
/// ```
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let _suspension = suspend_tracking();
    f()
}
