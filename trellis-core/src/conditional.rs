//! Conditional Rendering
//!
//! A conditional pairs a tracked discriminant with ordered cases. The first
//! case matching the current value produces the output; no match produces
//! nothing.
//!
//! Matching is memoized and depends only on the discriminant. The winning
//! handler runs untracked, so signals it reads do not re-run the match.

use std::fmt::Debug;
use std::rc::Rc;

use crate::reactive::{untrack, Memo, ReadSignal};
use crate::tag::{Child, DynConditional, Platform};

/// How a case decides whether it applies.
pub enum Pattern<T> {
    /// Equal to this value.
    Literal(T),
    /// The predicate returns true.
    Predicate(Rc<dyn Fn(&T) -> bool>),
}

impl<T: PartialEq> Pattern<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Pattern::Literal(expected) => expected == value,
            Pattern::Predicate(predicate) => predicate(value),
        }
    }
}

/// One arm of a conditional.
pub struct Case<T, O> {
    pattern: Pattern<T>,
    handler: Rc<dyn Fn() -> O>,
}

impl<T, O> Case<T, O> {
    /// Applies when the discriminant equals `value`.
    pub fn value(value: T, handler: impl Fn() -> O + 'static) -> Self {
        Self {
            pattern: Pattern::Literal(value),
            handler: Rc::new(handler),
        }
    }

    /// Applies when `predicate` holds for the discriminant.
    pub fn when(predicate: impl Fn(&T) -> bool + 'static, handler: impl Fn() -> O + 'static) -> Self {
        Self {
            pattern: Pattern::Predicate(Rc::new(predicate)),
            handler: Rc::new(handler),
        }
    }

    pub fn pattern(&self) -> &Pattern<T> {
        &self.pattern
    }
}

/// A tracked value and the cases it is matched against.
pub struct Conditional<T: 'static, O: 'static> {
    source: ReadSignal<T>,
    cases: Rc<[Case<T, O>]>,
}

impl<T: 'static, O: 'static> Conditional<T, O> {
    pub fn new(source: impl Into<ReadSignal<T>>, cases: impl IntoIterator<Item = Case<T, O>>) -> Self {
        Self {
            source: source.into(),
            cases: cases.into_iter().collect(),
        }
    }

    pub fn source(&self) -> &ReadSignal<T> {
        &self.source
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }
}

impl<T: 'static, O: 'static> Clone for Conditional<T, O> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            cases: Rc::clone(&self.cases),
        }
    }
}

impl<T: 'static, O: 'static> Debug for Conditional<T, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conditional")
            .field("cases", &self.cases.len())
            .finish()
    }
}

/// Build a conditional from a tracked value and its cases.
///
/// # Example
///
/// ```rust
/// use trellis_core::conditional::{match_branch, when, Case};
/// use trellis_core::reactive::Signal;
///
/// let status = Signal::new("on");
/// let label = when(
///     status.clone(),
///     [Case::value("on", || "ON"), Case::value("off", || "OFF")],
/// );
///
/// let branch = match_branch(&label);
/// assert_eq!(branch.get(), Some("ON"));
///
/// status.set("off");
/// assert_eq!(branch.get(), Some("OFF"));
///
/// status.set("unknown");
/// assert_eq!(branch.get(), None);
/// ```
pub fn when<T: 'static, O: 'static>(
    source: impl Into<ReadSignal<T>>,
    cases: impl IntoIterator<Item = Case<T, O>>,
) -> Conditional<T, O> {
    Conditional::new(source, cases)
}

/// Memoized output of the first case matching the current value.
///
/// Every recomputation counts as a change, even when the same case wins
/// again: handlers may return fresh output each time.
pub fn match_branch<T, O>(conditional: &Conditional<T, O>) -> Memo<Option<O>>
where
    T: PartialEq + 'static,
    O: 'static,
{
    let source = conditional.source.clone();
    let cases = Rc::clone(&conditional.cases);

    Memo::with_eq(
        move || {
            let value = source.get();
            cases
                .iter()
                .find(|case| case.pattern.matches(&value))
                .map(|case| untrack(|| (case.handler)()))
        },
        |_, _| false,
    )
}

impl<T: PartialEq + 'static, O: 'static> DynConditional<O> for Conditional<T, O> {
    fn branch(&self) -> Memo<Option<O>> {
        match_branch(self)
    }
}

impl<P: Platform, T: PartialEq + 'static> From<Conditional<T, Child<P>>> for Child<P> {
    fn from(conditional: Conditional<T, Child<P>>) -> Self {
        Child::Conditional(Rc::new(conditional))
    }
}
