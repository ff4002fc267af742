//! Keyed Lists
//!
//! A list renders one output per item and keeps those outputs cached by item
//! identity. When the backing collection changes:
//!
//! - items seen before reuse their cached output
//! - new items are rendered once and cached
//! - items that disappeared are evicted after the pass
//!
//! Items are keyed by `Eq + Hash`, so equal items share one cache entry and
//! duplicates render once. `Rc<T>` compares by value too; wrap items in
//! [`ByAddress`] to key them by allocation instead.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use tracing::trace;

use crate::reactive::{untrack, Memo, ReadSignal};
use crate::tag::{Child, DynList, Platform};

/// A tracked collection and the function rendering each item.
pub struct List<I: 'static, O: 'static> {
    items: ReadSignal<Vec<I>>,
    render_item: Rc<dyn Fn(&I) -> O>,
}

impl<I: 'static, O: 'static> List<I, O> {
    pub fn new(items: impl Into<ReadSignal<Vec<I>>>, render_item: impl Fn(&I) -> O + 'static) -> Self {
        Self {
            items: items.into(),
            render_item: Rc::new(render_item),
        }
    }

    pub fn items(&self) -> &ReadSignal<Vec<I>> {
        &self.items
    }
}

impl<I: 'static, O: 'static> Clone for List<I, O> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            render_item: Rc::clone(&self.render_item),
        }
    }
}

impl<I: 'static, O: 'static> Debug for List<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("List").finish_non_exhaustive()
    }
}

/// A shared item keyed by its allocation rather than its value.
///
/// Two `ByAddress` values are equal only when they point at the same `Rc`.
pub struct ByAddress<T>(pub Rc<T>);

impl<T> ByAddress<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(value))
    }
}

impl<T> Clone for ByAddress<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for ByAddress<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for ByAddress<T> {}

impl<T> Hash for ByAddress<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl<T> Deref for ByAddress<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> From<Rc<T>> for ByAddress<T> {
    fn from(rc: Rc<T>) -> Self {
        Self(rc)
    }
}

impl<T: Debug> Debug for ByAddress<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ByAddress").field(&self.0).finish()
    }
}

/// Build a list from a tracked collection and an item renderer.
///
/// `render_item` should be pure: its output is cached and reused for as long
/// as the item stays in the collection.
pub fn list<I: 'static, O: 'static>(
    items: impl Into<ReadSignal<Vec<I>>>,
    render_item: impl Fn(&I) -> O + 'static,
) -> List<I, O> {
    List::new(items, render_item)
}

/// Memoized outputs for the current items, in item order.
///
/// Each call owns a fresh cache. Reading the memo after the collection
/// changed renders only items that were not present in the previous pass.
///
/// # Example
///
/// ```rust
/// use trellis_core::list::{each, list};
/// use trellis_core::reactive::Signal;
///
/// let items = Signal::new(vec![1, 2]);
/// let outputs = each(&list(items.clone(), |n: &i32| n * 10));
///
/// assert_eq!(outputs.get(), vec![10, 20]);
/// items.set(vec![2, 3]);
/// assert_eq!(outputs.get(), vec![20, 30]);
/// ```
pub fn each<I, O>(list: &List<I, O>) -> Memo<Vec<O>>
where
    I: Eq + Hash + Clone + 'static,
    O: Clone + 'static,
{
    let items = list.items.clone();
    let render_item = Rc::clone(&list.render_item);
    let cache: Rc<RefCell<HashMap<I, O>>> = Rc::new(RefCell::new(HashMap::new()));

    Memo::with_eq(
        move || {
            let items = items.get();
            let mut cache = cache.borrow_mut();
            let mut stale: HashSet<I> = cache.keys().cloned().collect();
            let mut outputs = Vec::with_capacity(items.len());
            let mut rendered = 0usize;

            for item in &items {
                let output = match cache.get(item) {
                    Some(output) => output.clone(),
                    None => {
                        let output = untrack(|| render_item(item));
                        cache.insert(item.clone(), output.clone());
                        rendered += 1;
                        output
                    }
                };
                stale.remove(item);
                outputs.push(output);
            }

            for item in &stale {
                cache.remove(item);
            }

            trace!(
                items = items.len(),
                rendered,
                evicted = stale.len(),
                "reconciled list"
            );
            outputs
        },
        |_, _| false,
    )
}

impl<I, O> DynList<O> for List<I, O>
where
    I: Eq + Hash + Clone + 'static,
    O: Clone + 'static,
{
    fn reconcile(&self) -> Memo<Vec<O>> {
        each(self)
    }
}

impl<P: Platform, I> From<List<I, Child<P>>> for Child<P>
where
    I: Eq + Hash + Clone + 'static,
{
    fn from(list: List<I, Child<P>>) -> Self {
        Child::List(Rc::new(list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use std::cell::Cell;

    fn counting_list(items: &Signal<Vec<i32>>) -> (List<i32, Rc<String>>, Rc<Cell<usize>>) {
        let renders = Rc::new(Cell::new(0));
        let counter = renders.clone();
        let list = list(items.clone(), move |n: &i32| {
            counter.set(counter.get() + 1);
            Rc::new(format!("item {n}"))
        });
        (list, renders)
    }

    #[test]
    fn cached_items_are_reused() {
        let items = Signal::new(vec![1, 2, 3]);
        let (list, renders) = counting_list(&items);
        let outputs = each(&list);

        let first = outputs.get();
        items.set(vec![2, 3]);
        let second = outputs.get();
        items.set(vec![1, 2, 3]);
        let third = outputs.get();

        // 1, 2, 3, then 1 again after it was evicted
        assert_eq!(renders.get(), 4);
        assert!(Rc::ptr_eq(&first[1], &second[0]));
        assert!(Rc::ptr_eq(&second[0], &third[1]));
        assert!(!Rc::ptr_eq(&first[0], &third[0]));
    }

    #[test]
    fn output_follows_item_order() {
        let items = Signal::new(vec![1, 2, 3]);
        let (list, renders) = counting_list(&items);
        let outputs = each(&list);
        outputs.get();

        items.set(vec![3, 1, 2]);
        let labels: Vec<_> = outputs.get().iter().map(|s| s.to_string()).collect();

        assert_eq!(labels, vec!["item 3", "item 1", "item 2"]);
        assert_eq!(renders.get(), 3);
    }

    #[test]
    fn duplicates_share_one_entry() {
        let items = Signal::new(vec![7, 7]);
        let (list, renders) = counting_list(&items);
        let outputs = each(&list).get();

        assert_eq!(renders.get(), 1);
        assert!(Rc::ptr_eq(&outputs[0], &outputs[1]));
    }

    #[test]
    fn equal_rcs_share_an_entry_but_addresses_do_not() {
        let renders = Rc::new(Cell::new(0));

        let by_value = Signal::new(vec![Rc::new(1), Rc::new(1)]);
        let counter = renders.clone();
        each(&list(by_value, move |n: &Rc<i32>| {
            counter.set(counter.get() + 1);
            **n
        }))
        .get();
        assert_eq!(renders.get(), 1);

        let shared = ByAddress::new(1);
        let by_address = Signal::new(vec![ByAddress::new(1), ByAddress::new(1), shared.clone(), shared]);
        let counter = renders.clone();
        let outputs = each(&list(by_address, move |n: &ByAddress<i32>| {
            counter.set(counter.get() + 1);
            **n
        }))
        .get();

        assert_eq!(outputs, vec![1, 1, 1, 1]);
        assert_eq!(renders.get(), 1 + 3);
    }

    #[test]
    fn each_call_has_its_own_cache() {
        let items = Signal::new(vec![1]);
        let (list, renders) = counting_list(&items);

        each(&list).get();
        each(&list).get();

        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn render_reads_are_not_tracked() {
        let items = Signal::new(vec![1]);
        let suffix = Signal::new("!");
        let passes = Rc::new(Cell::new(0));

        let (s, p) = (suffix.clone(), passes.clone());
        let outputs = each(&list(items.clone(), move |n: &i32| {
            p.set(p.get() + 1);
            format!("{n}{}", s.get())
        }));

        assert_eq!(outputs.get(), vec!["1!".to_string()]);
        suffix.set("?");
        assert_eq!(outputs.get(), vec!["1!".to_string()]);
        assert_eq!(passes.get(), 1);
    }
}
