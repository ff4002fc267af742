//! DOM Patcher
//!
//! Dynamic children are rendered into regions. A region is a run of sibling
//! nodes owned by one effect:
//!
//! ```text
//! <!--ref:cond-->  ...branch nodes...  <!--ref:cond-->
//! <!--ref:list-->  ...item nodes...    <!--ref:list-->
//! <!--ref:signal-->                    (single sentinel, replaced in place)
//! ```
//!
//! When the effect re-runs, everything strictly between the sentinels is
//! removed and the fresh nodes are inserted after the start sentinel. The
//! sentinels themselves are never touched. Content is built in its own child
//! scope, which is disposed once the content is replaced.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::smallvec;
use tracing::trace;

use super::node::DomNode;
use super::setter::PropSetter;
use super::value::{format_number, Value};
use super::Dom;
use crate::config::RenderConfig;
use crate::reactive::{untrack, Effect, Memo, ReadSignal, Scope};
use crate::tag::{BuildChild, Child, ChildHandler, Nodes, PropHandler, PropOutcome, PropValue};

const CONDITIONAL: &str = "cond";
const LIST: &str = "list";
const SIGNAL: &str = "signal";

/// Remove every node strictly between `start` and `end`.
///
/// Returns how many nodes were removed. If `end` is not a later sibling of
/// `start`, everything after `start` is removed.
pub fn remove_between(start: &DomNode, end: &DomNode) -> usize {
    let mut removed = 0;
    let mut next = start.next_sibling();
    while let Some(node) = next {
        if node == *end {
            break;
        }
        next = node.next_sibling();
        node.remove();
        removed += 1;
    }
    removed
}

/// A fresh scope for region content, owned by `owner` when there is one.
fn content_scope(owner: &Option<Scope>) -> Scope {
    match owner {
        Some(owner) => owner.run(Scope::new),
        None => Scope::detached(),
    }
}

/// Mount a two-sentinel region.
///
/// `read` runs tracked and decides what to show. `render` turns that into
/// nodes and runs untracked, inside the content scope.
fn mount_region<V: 'static>(
    label: &'static str,
    config: &RenderConfig,
    build_child: &BuildChild<Dom>,
    read: impl Fn() -> V + 'static,
    render: impl Fn(V, &BuildChild<Dom>) -> Nodes<Dom> + 'static,
) -> Nodes<Dom> {
    let start = DomNode::comment(config.marker(label));
    let end = DomNode::comment(config.marker(label));

    let owner = Scope::current();
    let content: RefCell<Option<Scope>> = RefCell::new(None);
    let initial: Rc<RefCell<Nodes<Dom>>> = Rc::new(RefCell::new(Nodes::<Dom>::new()));
    let first_run = Rc::new(Cell::new(true));

    let effect = {
        let (start, end) = (start.clone(), end.clone());
        let build_child = Rc::clone(build_child);
        let initial = Rc::clone(&initial);
        let first_run = Rc::clone(&first_run);

        Effect::new(move || {
            let value = read();
            let scope = content_scope(&owner);
            let nodes = scope.run(|| untrack(|| render(value, &build_child)));

            let removed = remove_between(&start, &end);
            let mut anchor = start.clone();
            for node in &nodes {
                anchor.after(node);
                anchor = node.clone();
            }
            trace!(label, removed, inserted = nodes.len(), "patched region");

            if first_run.replace(false) {
                *initial.borrow_mut() = nodes;
            }
            if let Some(previous) = content.replace(Some(scope)) {
                previous.dispose();
            }
        })
    };
    trace!(label, effect = effect.id().raw(), "mounted region");

    let mut nodes: Nodes<Dom> = smallvec![start];
    nodes.extend(initial.take());
    nodes.push(end);
    nodes
}

/// Render a conditional's winning branch between two sentinels.
pub fn conditional_region(
    branch: Memo<Option<Child<Dom>>>,
    build_child: &BuildChild<Dom>,
    config: &RenderConfig,
) -> Nodes<Dom> {
    mount_region(
        CONDITIONAL,
        config,
        build_child,
        move || branch.get(),
        |child, build_child| {
            child
                .and_then(|child| build_child(&child))
                .unwrap_or_default()
        },
    )
}

/// Render reconciled list outputs between two sentinels, in item order.
pub fn list_region(
    outputs: Memo<Vec<Child<Dom>>>,
    build_child: &BuildChild<Dom>,
    config: &RenderConfig,
) -> Nodes<Dom> {
    mount_region(
        LIST,
        config,
        build_child,
        move || outputs.get(),
        |children, build_child| {
            children
                .iter()
                .filter_map(|child| build_child(child))
                .flatten()
                .collect()
        },
    )
}

/// Render a tracked child behind a single sentinel.
///
/// Tags are built (only their first node is kept), primitives become text
/// and anything else shows as a fresh sentinel.
pub fn tracked_region(
    read: ReadSignal<Child<Dom>>,
    build_child: &BuildChild<Dom>,
    config: &RenderConfig,
) -> Nodes<Dom> {
    let marker = config.marker(SIGNAL);
    let current = Rc::new(RefCell::new(DomNode::comment(marker.as_str())));
    let owner = Scope::current();
    let content: RefCell<Option<Scope>> = RefCell::new(None);

    {
        let current = Rc::clone(&current);
        let build_child = Rc::clone(build_child);

        Effect::new(move || {
            let child = read.get();
            let scope = content_scope(&owner);
            let node = scope
                .run(|| {
                    untrack(|| match &child {
                        Child::Tag(_) => build_child(&child).and_then(|nodes| nodes.into_iter().next()),
                        Child::Text(text) => Some(DomNode::text(text.as_str())),
                        Child::Number(n) => Some(DomNode::text(format_number(*n))),
                        Child::Bool(b) => Some(DomNode::text(b.to_string())),
                        _ => None,
                    })
                })
                .unwrap_or_else(|| DomNode::comment(marker.as_str()));

            let previous = current.replace(node.clone());
            previous.replace_with(&node);
            trace!(child = ?child, "patched tracked child");

            if let Some(previous) = content.replace(Some(scope)) {
                previous.dispose();
            }
        });
    }

    let node = current.borrow().clone();
    smallvec![node]
}

fn apply(setter: &PropSetter, element: &DomNode, name: &str, value: &Value) {
    match value {
        Value::Style(entries) if name == "style" => {
            for (key, value) in entries {
                element.set_style(key, value.as_str());
            }
        }
        _ => setter.set(element, name, value),
    }
}

/// The DOM prop handler. Claims every prop.
///
/// Tracked values are re-applied by an effect unless the name carries the
/// event prefix, in which case they are applied once. Listeners are
/// registered under the name without the prefix.
pub fn prop_handler(setter: Rc<PropSetter>, config: RenderConfig) -> PropHandler<Dom> {
    Rc::new(move |element: &DomNode, name: &str, value: &PropValue<Dom>| {
        match value {
            PropValue::Listener(listener) => {
                let event = config.event_name(name).unwrap_or(name);
                element.add_event_listener(event, Rc::clone(listener));
            }
            PropValue::Tracked(read) if !config.is_event(name) => {
                let (setter, element, name, read) =
                    (Rc::clone(&setter), element.clone(), name.to_string(), read.clone());
                Effect::new(move || apply(&setter, &element, &name, &read.get()));
            }
            PropValue::Tracked(read) => apply(&setter, element, name, &read.get_untracked()),
            PropValue::Static(value) => apply(&setter, element, name, value),
        }
        PropOutcome::Handled
    })
}

/// The DOM child handler.
///
/// Conditionals, lists and tracked children become regions. Text and
/// numbers become text nodes. Booleans and empty children produce nothing.
pub fn child_handler(config: RenderConfig) -> ChildHandler<Dom> {
    Rc::new(move |child: &Child<Dom>, build_child: &BuildChild<Dom>| match child {
        Child::Conditional(conditional) => {
            Some(conditional_region(conditional.branch(), build_child, &config))
        }
        Child::List(list) => Some(list_region(list.reconcile(), build_child, &config)),
        Child::Tracked(read) => Some(tracked_region(read.clone(), build_child, &config)),
        Child::Text(text) => Some(smallvec![DomNode::text(text.as_str())]),
        Child::Number(n) => Some(smallvec![DomNode::text(format_number(*n))]),
        Child::Bool(_) | Child::Empty | Child::Tag(_) => None,
    })
}
