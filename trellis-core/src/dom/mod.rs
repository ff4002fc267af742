//! DOM Platform
//!
//! Renders tag trees into an in-memory DOM. The platform contributes:
//!
//! - [`DomNode`], a reference-counted node tree with sibling-relative
//!   insertion, attributes, properties, style and listeners
//! - a prop handler that routes values through a cached [`PropSetter`]
//! - a child handler that mounts conditionals, lists and tracked children as
//!   sentinel-delimited regions
//! - HTML and SVG tag catalogs
//!
//! [`DomRenderer`] bundles all of it behind one root.

mod node;
mod patcher;
mod setter;
mod sync;
mod tags;
mod value;

use std::rc::Rc;

use tracing::debug;

pub use node::{DomNode, Event, Listener, NodeType};
pub use patcher::{
    child_handler, conditional_region, list_region, prop_handler, remove_between, tracked_region,
};
pub use setter::{PropSetter, Reflect, Setter};
pub use sync::{sync_value, SyncValue};
pub use tags::{html_catalog, svg_catalog, HTML_TAGS, SVG_NAMESPACE, SVG_TAGS};
pub use value::{format_number, Value};

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::reactive::{Memo, ReadSignal, Signal};
use crate::tag::{Handlers, Platform, PropValue, Root, TagCatalog, TagDescriptor};

/// The in-memory DOM platform.
#[derive(Debug, Clone, Copy)]
pub struct Dom;

impl Platform for Dom {
    type Node = DomNode;
    type Value = Value;
    type Event = Event;
}

macro_rules! static_prop {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropValue<Dom> {
                fn from(value: $ty) -> Self {
                    PropValue::Static(Value::from(value))
                }
            }
        )*
    };
}

static_prop!(&str, String, bool, i32, i64, u32, u64, usize, f32, f64, Value);

impl<T: Into<Value> + Clone + 'static> From<ReadSignal<T>> for PropValue<Dom> {
    fn from(read: ReadSignal<T>) -> Self {
        PropValue::Tracked(read.map(Into::into))
    }
}

impl<T: Into<Value> + Clone + 'static> From<Signal<T>> for PropValue<Dom> {
    fn from(signal: Signal<T>) -> Self {
        ReadSignal::from(signal).into()
    }
}

impl<T: Into<Value> + Clone + 'static> From<Memo<T>> for PropValue<Dom> {
    fn from(memo: Memo<T>) -> Self {
        ReadSignal::from(memo).into()
    }
}

/// A DOM root with its tag catalogs and setter cache.
///
/// # Example
///
/// ```rust
/// use trellis_core::conditional::{when, Case};
/// use trellis_core::dom::{Dom, DomNode, DomRenderer};
/// use trellis_core::reactive::Signal;
/// use trellis_core::tag::Child;
///
/// let renderer = DomRenderer::new();
/// let status = Signal::new("on");
///
/// let tag = renderer.tag("div").unwrap().child(when(
///     status.clone(),
///     [
///         Case::value("on", || Child::<Dom>::from("ON")),
///         Case::value("off", || Child::<Dom>::from("OFF")),
///     ],
/// ));
///
/// let body = DomNode::element("body");
/// let div = renderer.mount(&body, &tag);
/// assert_eq!(div.text_content(), "ON");
///
/// status.set("off");
/// assert_eq!(div.text_content(), "OFF");
/// ```
pub struct DomRenderer {
    root: Root<Dom>,
    html: TagCatalog<Dom>,
    svg: TagCatalog<Dom>,
    setter: Rc<PropSetter>,
}

impl DomRenderer {
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    pub fn with_config(config: RenderConfig) -> Self {
        let setter = Rc::new(PropSetter::new());

        let mut handlers = Handlers::new();
        handlers.props.push(prop_handler(Rc::clone(&setter), config.clone()));
        handlers.children.push(child_handler(config.clone()));
        let handlers = Rc::new(handlers);

        debug!(?config, "creating DOM renderer");
        Self {
            root: Root::with_config(|parent: &DomNode, child: &DomNode| parent.append_child(child), config),
            html: html_catalog(Rc::clone(&handlers)),
            svg: svg_catalog(handlers),
            setter,
        }
    }

    /// A descriptor for an HTML tag.
    pub fn tag(&self, name: &str) -> Result<TagDescriptor<Dom>, RenderError> {
        self.html.tag(name)
    }

    /// A descriptor for an SVG tag.
    pub fn svg_tag(&self, name: &str) -> Result<TagDescriptor<Dom>, RenderError> {
        self.svg.tag(name)
    }

    pub fn build(&self, tag: &TagDescriptor<Dom>) -> DomNode {
        self.root.build(tag)
    }

    /// Build `tag` and append it to `parent`.
    pub fn mount(&self, parent: &DomNode, tag: &TagDescriptor<Dom>) -> DomNode {
        let node = self.build(tag);
        parent.append_child(&node);
        node
    }

    /// Stop every effect created by this renderer's builds. Built nodes stay
    /// where they are but no longer update.
    pub fn dispose(&self) {
        self.root.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.root.is_disposed()
    }

    pub fn setter(&self) -> &PropSetter {
        &self.setter
    }

    pub fn config(&self) -> &RenderConfig {
        self.root.config()
    }

    pub fn root(&self) -> &Root<Dom> {
        &self.root
    }
}

impl Default for DomRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::list;
    use crate::tag::Child;

    #[test]
    fn builds_nested_tags() {
        let renderer = DomRenderer::new();
        let tag = renderer
            .tag("ul")
            .unwrap()
            .prop("id", "menu")
            .child(renderer.tag("li").unwrap().child("one"))
            .child(renderer.tag("li").unwrap().child(2));

        let ul = renderer.build(&tag);
        assert_eq!(ul.to_html(), r#"<ul id="menu"><li>one</li><li>2</li></ul>"#);
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let renderer = DomRenderer::new();
        assert!(matches!(renderer.tag("blink"), Err(RenderError::UnknownTag(name)) if name == "blink"));
    }

    #[test]
    fn svg_tags_use_their_own_catalog() {
        let renderer = DomRenderer::new();
        let svg = renderer.build(&renderer.svg_tag("svg").unwrap().child(renderer.svg_tag("circle").unwrap()));

        assert_eq!(svg.namespace(), Some(SVG_NAMESPACE));
        assert_eq!(svg.first_child().and_then(|c| c.tag_name().map(str::to_string)).as_deref(), Some("circle"));
    }

    #[test]
    fn list_of_tags() {
        let renderer = Rc::new(DomRenderer::new());
        let items = Signal::new(vec!["a", "b"]);

        let r = Rc::clone(&renderer);
        let tag = renderer.tag("ul").unwrap().child(list(items.clone(), move |item: &&str| {
            Child::<Dom>::from(r.tag("li").unwrap().child(*item))
        }));
        let ul = renderer.build(&tag);
        assert_eq!(
            ul.to_html(),
            "<ul><!--ref:list--><li>a</li><li>b</li><!--ref:list--></ul>"
        );

        items.set(vec!["b"]);
        assert_eq!(ul.to_html(), "<ul><!--ref:list--><li>b</li><!--ref:list--></ul>");
    }

    #[test]
    fn dispose_stops_updates() {
        let renderer = DomRenderer::new();
        let title = Signal::new("a".to_string());
        let div = renderer.build(&renderer.tag("div").unwrap().prop("title", title.clone()));

        renderer.dispose();
        title.set("b".to_string());

        assert!(renderer.is_disposed());
        assert_eq!(div.attribute("title").as_deref(), Some("a"));
    }

    #[test]
    fn custom_marker_prefix() {
        let config = RenderConfig::from_json(r#"{ "marker_prefix": "t:" }"#).unwrap();
        let renderer = DomRenderer::with_config(config);
        let shown = Signal::new(true);

        let div = renderer.build(&renderer.tag("div").unwrap().child(Child::<Dom>::tracked(move || {
            if shown.get() { Child::from("yes") } else { Child::Empty }
        })));
        assert_eq!(div.to_html(), "<div>yes</div>");
        assert_eq!(renderer.config().marker("signal"), "t:signal");
    }
}
