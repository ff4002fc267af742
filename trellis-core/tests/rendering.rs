//! Integration Tests for Rendering
//!
//! These tests build tag trees onto the DOM platform and check that regions,
//! props and teardown behave as the user sees them.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trellis_core::conditional::{match_branch, when, Case};
use trellis_core::dom::{Dom, DomNode, DomRenderer, Event, Value};
use trellis_core::helpers::{create_toggle, toggle, Toggle};
use trellis_core::list::{each, list};
use trellis_core::reactive::{Effect, Signal};
use trellis_core::tag::{Child, PropValue};

/// Nodes between the first two comment children of `parent`.
fn region_content(parent: &DomNode) -> Vec<DomNode> {
    let children = parent.children();
    let start = children.iter().position(DomNode::is_comment);
    let end = children.iter().rposition(DomNode::is_comment);
    match (start, end) {
        (Some(start), Some(end)) if start < end => children[start + 1..end].to_vec(),
        _ => Vec::new(),
    }
}

fn comment_count(parent: &DomNode) -> usize {
    parent.children().iter().filter(|node| node.is_comment()).count()
}

/// `Conditional(status, ['on' -> 'ON', 'off' -> 'OFF'])`
#[test]
fn on_off_scenario() {
    let renderer = DomRenderer::new();
    let status = Signal::new("on");
    let renders = Rc::new(Cell::new(0));

    let (on_renders, off_renders) = (renders.clone(), renders.clone());
    let div = renderer.build(&renderer.tag("div").unwrap().child(when(
        status.clone(),
        [
            Case::value("on", move || {
                on_renders.set(on_renders.get() + 1);
                Child::<Dom>::from("ON")
            }),
            Case::value("off", move || {
                off_renders.set(off_renders.get() + 1);
                Child::<Dom>::from("OFF")
            }),
        ],
    )));
    assert_eq!(div.text_content(), "ON");
    assert_eq!(renders.get(), 1);

    status.set("off");
    assert_eq!(div.text_content(), "OFF");
    assert_eq!(renders.get(), 2);

    // writing the same status again leaves the region untouched
    let shown = region_content(&div);
    status.set("off");
    assert_eq!(renders.get(), 2);
    assert_eq!(region_content(&div), shown);

    status.set("broken");
    assert_eq!(div.text_content(), "");
    assert_eq!(div.to_html(), "<div><!--ref:cond--><!--ref:cond--></div>");

    status.set("on");
    assert_eq!(div.text_content(), "ON");
    assert_eq!(renders.get(), 3);
}

/// `List([1, 2], x * 10)`, then `[2, 3]`, many times over.
#[test]
fn list_scenario() {
    let renderer = DomRenderer::new();
    let items = Signal::new(vec![1, 2]);
    let renders = Arc::new(AtomicUsize::new(0));

    let counter = renders.clone();
    let ul = renderer.build(&renderer.tag("ul").unwrap().child(list(
        items.clone(),
        move |n: &i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            Child::<Dom>::from(n * 10)
        },
    )));
    assert_eq!(ul.text_content(), "1020");

    for _ in 0..10 {
        items.set(vec![2, 3]);
        assert_eq!(ul.text_content(), "2030");
        items.set(vec![1, 2]);
        assert_eq!(ul.text_content(), "1020");
    }

    // 1 and 2 at mount, then 3 and 1 once per round; 2 is never evicted
    assert_eq!(renders.load(Ordering::SeqCst), 2 + 2 * 10);
    assert_eq!(comment_count(&ul), 2);
}

#[test]
fn list_cache_reuses_outputs() {
    let items = Signal::new(vec![1, 2, 3]);
    let renders = Rc::new(Cell::new(0));
    let counter = renders.clone();
    let outputs = each(&list(items.clone(), move |n: &i32| {
        counter.set(counter.get() + 1);
        Rc::new(*n)
    }));

    let first = outputs.get();
    items.set(vec![2, 3]);
    let second = outputs.get();
    items.set(vec![1, 2, 3]);
    let third = outputs.get();

    assert_eq!(renders.get(), 4);
    assert!(Rc::ptr_eq(&first[1], &second[0]));
    assert!(Rc::ptr_eq(&first[1], &third[1]));
}

/// After every recomputation the region holds exactly the fresh output and
/// both sentinels.
#[test]
fn region_replacement_is_atomic() {
    let renderer = DomRenderer::new();
    let items = Signal::new(vec!["a", "b", "c"]);

    let section = renderer.build(
        &renderer
            .tag("section")
            .unwrap()
            .child(list(items.clone(), |item: &&str| Child::<Dom>::from(*item))),
    );

    for next in [vec!["c"], vec![], vec!["b", "a", "d", "e"], vec!["e"]] {
        items.set(next.clone());
        let content: Vec<String> = region_content(&section).iter().map(DomNode::text_content).collect();

        assert_eq!(content, next);
        assert_eq!(comment_count(&section), 2);
        assert_eq!(section.child_count(), next.len() + 2);
    }
}

#[test]
fn regions_keep_their_siblings() {
    let renderer = DomRenderer::new();
    let shown = Signal::new(true);

    let p = renderer.build(
        &renderer
            .tag("p")
            .unwrap()
            .child("before ")
            .child(when(shown.clone(), [Case::value(true, || Child::<Dom>::from("middle"))]))
            .child(" after"),
    );
    assert_eq!(p.text_content(), "before middle after");

    shown.set(false);
    assert_eq!(p.text_content(), "before  after");
    shown.set(true);
    assert_eq!(p.text_content(), "before middle after");
}

/// A signal read inside the active branch does not re-run the match.
#[test]
fn conditional_single_evaluation() {
    let status = Signal::new(true);
    let detail = Signal::new(0);
    let handler_runs = Rc::new(Cell::new(0));

    let (d, runs) = (detail.clone(), handler_runs.clone());
    let branch = match_branch(&when(
        status.clone(),
        [Case::value(true, move || {
            runs.set(runs.get() + 1);
            d.get()
        })],
    ));
    let observed = branch.clone();
    let effect = Effect::new(move || {
        observed.get();
    });

    detail.set(1);
    detail.set(2);

    assert_eq!(handler_runs.get(), 1);
    assert_eq!(effect.run_count(), 1);
}

#[test]
fn setter_cache_per_tag_and_prop() {
    let renderer = DomRenderer::new();
    let tag = renderer
        .tag("form")
        .unwrap()
        .child(renderer.tag("input").unwrap().prop("value", "one"))
        .child(renderer.tag("input").unwrap().prop("value", "two"))
        .child(renderer.tag("div").unwrap().prop("value", "three"));

    let form = renderer.build(&tag);
    let children = form.children();

    assert_eq!(renderer.setter().len(), 2);
    assert_eq!(renderer.setter().resolutions(), 2);
    assert_eq!(children[0].value(), "one");
    assert_eq!(children[1].value(), "two");
    assert_eq!(children[0].attribute("value"), None);
    assert_eq!(children[2].attribute("value").as_deref(), Some("three"));
}

#[test]
fn tracked_props_and_listeners() {
    let renderer = DomRenderer::new();
    let status = create_toggle();

    let (label, flip) = (status.clone(), status.clone());
    let button = renderer.build(
        &renderer
            .tag("button")
            .unwrap()
            .prop("className", PropValue::<Dom>::tracked(move || Value::from(label.get().to_string())))
            .prop("onclick", PropValue::<Dom>::listener(move |_: &Event| toggle(&flip)))
            .child(status.clone()),
    );
    assert_eq!(button.to_html(), r#"<button class="off">off</button>"#);

    button.dispatch("click");
    assert_eq!(status.get(), Toggle::On);
    assert_eq!(button.to_html(), r#"<button class="on">on</button>"#);
}

#[test]
fn nested_tags_inside_a_conditional() {
    let renderer = Rc::new(DomRenderer::new());
    let logged_in = Signal::new(false);
    let name = Signal::new("ada".to_string());

    let (r, n) = (Rc::clone(&renderer), name.clone());
    let header = renderer.build(&renderer.tag("header").unwrap().child(when(
        logged_in.clone(),
        [
            Case::value(true, move || {
                Child::<Dom>::from(r.tag("span").unwrap().prop("title", n.clone()).child(n.clone()))
            }),
            Case::value(false, || Child::<Dom>::from("guest")),
        ],
    )));
    assert_eq!(header.text_content(), "guest");

    logged_in.set(true);
    assert_eq!(
        header.to_html(),
        r#"<header><!--ref:cond--><span title="ada">ada</span><!--ref:cond--></header>"#
    );

    name.set("grace".to_string());
    assert_eq!(
        header.to_html(),
        r#"<header><!--ref:cond--><span title="grace">grace</span><!--ref:cond--></header>"#
    );
}

/// Replaced content stops reacting; the renderer's dispose stops the rest.
#[test]
fn teardown_stops_replaced_content() {
    let renderer = Rc::new(DomRenderer::new());
    let page = Signal::new(1);
    let counter = Signal::new(0);
    let reads = Rc::new(Cell::new(0));

    let (r, c, seen) = (Rc::clone(&renderer), counter.clone(), reads.clone());
    let main = renderer.build(&renderer.tag("main").unwrap().child(when(
        page.clone(),
        [Case::when(|_: &i32| true, move || {
            let (c, seen) = (c.clone(), seen.clone());
            Child::<Dom>::from(r.tag("p").unwrap().child(Child::<Dom>::tracked(move || {
                seen.set(seen.get() + 1);
                Child::from(c.get())
            })))
        })],
    )));
    assert_eq!(reads.get(), 1);

    counter.set(1);
    assert_eq!(reads.get(), 2);

    // the old paragraph's effect is gone, only the new one reads
    page.set(2);
    assert_eq!(reads.get(), 3);
    counter.set(2);
    assert_eq!(reads.get(), 4);
    assert_eq!(main.text_content(), "2");

    renderer.dispose();
    counter.set(3);
    assert_eq!(reads.get(), 4);
    assert_eq!(main.text_content(), "2");
}

/// Regions built inside list items keep reacting after the list mounted.
#[test]
fn conditional_inside_list_items_updates_after_mount() {
    let renderer = Rc::new(DomRenderer::new());
    let items = Signal::new(vec![1, 2]);
    let expanded = Signal::new(true);

    let (r, flag) = (Rc::clone(&renderer), expanded.clone());
    let ul = renderer.build(&renderer.tag("ul").unwrap().child(list(items.clone(), move |n: &i32| {
        let n = *n;
        Child::<Dom>::from(r.tag("li").unwrap().child(when(
            flag.clone(),
            [
                Case::value(true, move || Child::<Dom>::from(n)),
                Case::value(false, || Child::<Dom>::from("-")),
            ],
        )))
    })));
    assert_eq!(ul.text_content(), "12");

    expanded.set(false);
    assert_eq!(ul.text_content(), "--");

    expanded.set(true);
    assert_eq!(ul.text_content(), "12");

    items.set(vec![2, 3]);
    assert_eq!(ul.text_content(), "23");
    expanded.set(false);
    assert_eq!(ul.text_content(), "--");
}

/// A conditional nested in a branch follows its own signal until the outer
/// branch is replaced.
#[test]
fn nested_conditional_updates_after_mount() {
    let renderer = Rc::new(DomRenderer::new());
    let outer = Signal::new(true);
    let inner = Signal::new("a");

    let (r, i) = (Rc::clone(&renderer), inner.clone());
    let section = renderer.build(&renderer.tag("section").unwrap().child(when(
        outer.clone(),
        [
            Case::value(true, move || {
                Child::<Dom>::from(r.tag("p").unwrap().child(when(
                    i.clone(),
                    [
                        Case::value("a", || Child::<Dom>::from("A")),
                        Case::value("b", || Child::<Dom>::from("B")),
                    ],
                )))
            }),
            Case::value(false, || Child::<Dom>::from("closed")),
        ],
    )));
    assert_eq!(section.text_content(), "A");

    inner.set("b");
    assert_eq!(section.text_content(), "B");

    outer.set(false);
    assert_eq!(section.text_content(), "closed");
    inner.set("a");
    assert_eq!(section.text_content(), "closed");

    outer.set(true);
    assert_eq!(section.text_content(), "A");
}

#[test]
fn html_and_svg_tags_resolve_setters_separately() {
    let renderer = DomRenderer::new();
    let tag = renderer
        .tag("div")
        .unwrap()
        .child(renderer.tag("a").unwrap().prop("href", "/docs"))
        .child(renderer.svg_tag("svg").unwrap().child(renderer.svg_tag("a").unwrap().prop("href", "#top")));

    let div = renderer.build(&tag);
    let children = div.children();
    let svg_link = children[1].first_child().unwrap();

    assert_eq!(renderer.setter().len(), 2);
    assert_eq!(children[0].attribute("href").as_deref(), Some("/docs"));
    assert_eq!(svg_link.attribute("href").as_deref(), Some("#top"));
    assert_eq!(svg_link.property("href"), None);
}
