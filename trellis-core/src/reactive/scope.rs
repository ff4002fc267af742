//! Effect Scopes
//!
//! A scope groups effects so they can be disposed together. Rendering creates
//! one scope per root and one child scope per piece of region content, so
//! replacing content stops every effect the old content created.
//!
//! Scopes nest: a scope created while another one is active becomes its child
//! and is disposed with it.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::effect::Effect;

thread_local! {
    static ACTIVE_SCOPE: RefCell<Option<Rc<ScopeInner>>> = const { RefCell::new(None) };
}

type Cleanup = Box<dyn FnOnce()>;

struct ScopeInner {
    active: Cell<bool>,
    effects: RefCell<Vec<Effect>>,
    cleanups: RefCell<Vec<Cleanup>>,
    children: RefCell<Vec<Rc<ScopeInner>>>,
    parent: Option<Weak<ScopeInner>>,
}

impl ScopeInner {
    fn dispose(self: &Rc<Self>) {
        if !self.active.replace(false) {
            return;
        }

        let effects: Vec<_> = self.effects.borrow_mut().drain(..).collect();
        let cleanups: Vec<_> = self.cleanups.borrow_mut().drain(..).collect();
        let children: Vec<_> = self.children.borrow_mut().drain(..).collect();
        trace!(
            effects = effects.len(),
            cleanups = cleanups.len(),
            children = children.len(),
            "disposing scope"
        );

        for child in children {
            child.dispose();
        }
        for effect in effects {
            effect.dispose();
        }
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }

        if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
            if let Ok(mut siblings) = parent.children.try_borrow_mut() {
                siblings.retain(|sibling| !Rc::ptr_eq(sibling, self));
            }
        }
    }
}

/// Restores the previously active scope when dropped.
struct ActiveScopeGuard {
    previous: Option<Rc<ScopeInner>>,
}

impl Drop for ActiveScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = ACTIVE_SCOPE.try_with(|active| *active.borrow_mut() = previous);
    }
}

/// A group of effects and cleanups that are disposed together.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{Effect, Scope, Signal};
///
/// let count = Signal::new(0);
/// let scope = Scope::new();
///
/// let reader = count.clone();
/// let effect = scope.run(|| Effect::new(move || { reader.get(); }));
///
/// scope.dispose();
/// count.set(1);
/// assert_eq!(effect.run_count(), 1);
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    /// Create a scope. If another scope is active it becomes the parent.
    pub fn new() -> Self {
        let parent = ACTIVE_SCOPE.with(|active| active.borrow().clone());
        let inner = Rc::new(ScopeInner {
            active: Cell::new(true),
            effects: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
            parent: parent.as_ref().map(Rc::downgrade),
        });

        if let Some(parent) = parent {
            if parent.active.get() {
                parent.children.borrow_mut().push(Rc::clone(&inner));
            } else {
                // Nothing would ever dispose it
                inner.active.set(false);
            }
        }

        Self { inner }
    }

    /// Create a scope that is not owned by the active one.
    pub fn detached() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                active: Cell::new(true),
                effects: RefCell::new(Vec::new()),
                cleanups: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
                parent: None,
            }),
        }
    }

    /// The scope new effects are currently collected into, if any.
    pub fn current() -> Option<Self> {
        ACTIVE_SCOPE.with(|active| active.borrow().clone().map(|inner| Self { inner }))
    }

    /// Run `f` with this scope active.
    ///
    /// Effects created by `f` are owned by this scope. If the scope was
    /// already disposed they are disposed before they ever run.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous =
            ACTIVE_SCOPE.with(|active| active.borrow_mut().replace(Rc::clone(&self.inner)));
        let _guard = ActiveScopeGuard { previous };
        f()
    }

    /// Register a function to run when the scope is disposed.
    ///
    /// Cleanups run in reverse registration order. On a disposed scope the
    /// cleanup runs immediately.
    pub fn on_cleanup(&self, f: impl FnOnce() + 'static) {
        if self.inner.active.get() {
            self.inner.cleanups.borrow_mut().push(Box::new(f));
        } else {
            f();
        }
    }

    /// Dispose every effect, child scope and cleanup in this scope.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub fn effect_count(&self) -> usize {
        self.inner.effects.borrow().len()
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("active", &self.is_active())
            .field("effects", &self.effect_count())
            .field("children", &self.child_count())
            .finish()
    }
}

/// Hand a new effect to the active scope.
///
/// Returns false when the active scope is already disposed.
pub(crate) fn adopt(effect: &Effect) -> bool {
    ACTIVE_SCOPE.with(|active| match active.borrow().as_ref() {
        Some(scope) if !scope.active.get() => false,
        Some(scope) => {
            scope.effects.borrow_mut().push(effect.clone());
            true
        }
        None => true,
    })
}

/// Register a cleanup on the active scope.
///
/// Returns false (and drops `f`) when no scope is active.
pub fn on_cleanup(f: impl FnOnce() + 'static) -> bool {
    match Scope::current() {
        Some(scope) => {
            scope.on_cleanup(f);
            true
        }
        None => false,
    }
}
