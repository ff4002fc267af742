//! Prop Setter Cache
//!
//! Deciding how a prop lands on an element (native property or plain
//! attribute) depends only on the element's type and the prop's name. An
//! element's type is its namespace plus its tag, so an HTML `a` and an SVG `a`
//! resolve separately. The decision is made on first use and cached.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tracing::trace;

use super::node::DomNode;
use super::value::Value;

/// Any element.
const ALL: &[&str] = &[];

/// Native props that also exist on namespaced (SVG, MathML) elements.
const NAMESPACED: &[&str] = &["id", "textContent"];

/// How a native property behaves when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflect {
    /// Stored as a property only.
    Property,
    /// Mirrored to the named attribute.
    Attribute(&'static str),
    /// Mirrored to the named attribute as a boolean (present or absent).
    BooleanAttribute(&'static str),
    /// Replaces the children with one text node.
    TextContent,
}

struct NativeProp {
    name: &'static str,
    tags: &'static [&'static str],
    reflect: Reflect,
}

const NATIVE_PROPS: &[NativeProp] = &[
    NativeProp { name: "id", tags: ALL, reflect: Reflect::Attribute("id") },
    NativeProp { name: "className", tags: ALL, reflect: Reflect::Attribute("class") },
    NativeProp { name: "title", tags: ALL, reflect: Reflect::Attribute("title") },
    NativeProp { name: "hidden", tags: ALL, reflect: Reflect::BooleanAttribute("hidden") },
    NativeProp { name: "textContent", tags: ALL, reflect: Reflect::TextContent },
    NativeProp { name: "htmlFor", tags: &["label", "output"], reflect: Reflect::Attribute("for") },
    NativeProp {
        name: "value",
        tags: &["input", "textarea", "select", "option", "button"],
        reflect: Reflect::Property,
    },
    NativeProp { name: "checked", tags: &["input"], reflect: Reflect::Property },
    NativeProp {
        name: "disabled",
        tags: &["button", "input", "select", "textarea", "fieldset", "option"],
        reflect: Reflect::BooleanAttribute("disabled"),
    },
    NativeProp { name: "href", tags: &["a", "area", "link", "base"], reflect: Reflect::Attribute("href") },
    NativeProp {
        name: "src",
        tags: &["img", "script", "iframe", "audio", "video", "source", "embed"],
        reflect: Reflect::Attribute("src"),
    },
    NativeProp { name: "type", tags: &["input", "button", "script"], reflect: Reflect::Attribute("type") },
    NativeProp {
        name: "placeholder",
        tags: &["input", "textarea"],
        reflect: Reflect::Attribute("placeholder"),
    },
    NativeProp {
        name: "name",
        tags: &["input", "select", "textarea", "button", "form"],
        reflect: Reflect::Attribute("name"),
    },
];

/// A resolved way of applying one prop to one kind of element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setter {
    Native(&'static str, Reflect),
    Attribute,
}

impl Setter {
    fn resolve(namespace: Option<&str>, tag: &str, prop: &str) -> Self {
        if namespace.is_some() && !NAMESPACED.contains(&prop) {
            return Setter::Attribute;
        }
        NATIVE_PROPS
            .iter()
            .find(|native| native.name == prop && (native.tags.is_empty() || native.tags.contains(&tag)))
            .map_or(Setter::Attribute, |native| Setter::Native(native.name, native.reflect))
    }

    fn apply(self, element: &DomNode, prop: &str, value: &Value) {
        match self {
            Setter::Attribute => element.set_attribute(prop, value.to_string()),
            Setter::Native(name, reflect) => {
                element.set_property(name, value.clone());
                match reflect {
                    Reflect::Property => {}
                    Reflect::Attribute(attribute) => element.set_attribute(attribute, value.to_string()),
                    Reflect::BooleanAttribute(attribute) => {
                        if value.is_truthy() {
                            element.set_attribute(attribute, "");
                        } else {
                            element.remove_attribute(attribute);
                        }
                    }
                    Reflect::TextContent => {
                        for child in element.children() {
                            child.remove();
                        }
                        element.append_child(&DomNode::text(value.to_string()));
                    }
                }
            }
        }
    }
}

/// Namespace (`None` for HTML), tag and prop.
type SetterKey = (Option<String>, String, String);

fn key_for(element: &DomNode, prop: &str) -> SetterKey {
    (
        element.namespace().map(str::to_string),
        element.tag_name().unwrap_or_default().to_string(),
        prop.to_string(),
    )
}

/// Per-root cache of resolved setters.
#[derive(Default)]
pub struct PropSetter {
    cache: RefCell<HashMap<SetterKey, Setter>>,
    resolutions: Cell<usize>,
}

impl PropSetter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `value` to `element` under `prop`.
    pub fn set(&self, element: &DomNode, prop: &str, value: &Value) {
        self.setter_for(element, prop).apply(element, prop, value);
    }

    /// The setter for this element's type and `prop`, resolved on first use.
    pub fn setter_for(&self, element: &DomNode, prop: &str) -> Setter {
        let key = key_for(element, prop);

        if let Some(setter) = self.cache.borrow().get(&key) {
            return *setter;
        }

        let (namespace, tag, _) = &key;
        let setter = Setter::resolve(namespace.as_deref(), tag, prop);
        trace!(?namespace, %tag, prop, ?setter, "resolved prop setter");
        self.resolutions.set(self.resolutions.get() + 1);
        self.cache.borrow_mut().insert(key, setter);
        setter
    }

    /// Number of cached `(element type, prop)` entries.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// How many lookups had to resolve a setter instead of hitting the cache.
    pub fn resolutions(&self) -> usize {
        self.resolutions.get()
    }

    pub fn is_cached(&self, element: &DomNode, prop: &str) -> bool {
        self.cache.borrow().contains_key(&key_for(element, prop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SVG_NAMESPACE;

    #[test]
    fn native_and_attribute_setters() {
        let setter = PropSetter::new();
        let input = DomNode::element("input");

        setter.set(&input, "value", &Value::from("typed"));
        setter.set(&input, "className", &Value::from("field"));
        setter.set(&input, "data-id", &Value::from(7));

        assert_eq!(input.property("value"), Some(Value::from("typed")));
        assert_eq!(input.attribute("value"), None);
        assert_eq!(input.attribute("class").as_deref(), Some("field"));
        assert_eq!(input.attribute("data-id").as_deref(), Some("7"));
    }

    #[test]
    fn setters_are_cached_per_tag_and_prop() {
        let setter = PropSetter::new();
        let first = DomNode::element("input");
        let second = DomNode::element("input");

        setter.set(&first, "value", &Value::from("a"));
        setter.set(&second, "value", &Value::from("b"));

        assert_eq!(setter.len(), 1);
        assert_eq!(setter.resolutions(), 1);
        assert_eq!(first.value(), "a");
        assert_eq!(second.value(), "b");
    }

    #[test]
    fn different_tags_get_different_entries() {
        let setter = PropSetter::new();
        let input = DomNode::element("input");
        let div = DomNode::element("div");

        setter.set(&input, "value", &Value::from("x"));
        setter.set(&div, "value", &Value::from("y"));

        assert_eq!(setter.len(), 2);
        assert!(setter.is_cached(&input, "value"));
        assert!(setter.is_cached(&div, "value"));
        assert_eq!(setter.setter_for(&div, "value"), Setter::Attribute);
        assert_eq!(div.attribute("value").as_deref(), Some("y"));
        assert_eq!(input.attribute("value"), None);
    }

    #[test]
    fn html_and_svg_elements_with_one_name_are_separate_entries() {
        let setter = PropSetter::new();
        let link = DomNode::element("a");
        let svg_link = DomNode::element_ns(SVG_NAMESPACE, "a");

        setter.set(&link, "href", &Value::from("/home"));
        setter.set(&svg_link, "href", &Value::from("#shape"));

        assert_eq!(setter.len(), 2);
        assert_eq!(setter.resolutions(), 2);
        assert_eq!(setter.setter_for(&link, "href"), Setter::Native("href", Reflect::Attribute("href")));
        assert_eq!(setter.setter_for(&svg_link, "href"), Setter::Attribute);
        assert_eq!(link.property("href"), Some(Value::from("/home")));
        assert_eq!(svg_link.property("href"), None);
        assert_eq!(svg_link.attribute("href").as_deref(), Some("#shape"));
    }

    #[test]
    fn namespaced_elements_keep_shared_native_props() {
        let setter = PropSetter::new();
        let circle = DomNode::element_ns(SVG_NAMESPACE, "circle");

        setter.set(&circle, "id", &Value::from("dot"));
        setter.set(&circle, "className", &Value::from("big"));

        assert_eq!(setter.setter_for(&circle, "id"), Setter::Native("id", Reflect::Attribute("id")));
        assert_eq!(circle.attribute("id").as_deref(), Some("dot"));
        assert_eq!(circle.attribute("className").as_deref(), Some("big"));
        assert_eq!(circle.attribute("class"), None);
    }

    #[test]
    fn boolean_attributes_toggle() {
        let setter = PropSetter::new();
        let button = DomNode::element("button");

        setter.set(&button, "disabled", &Value::from(true));
        assert_eq!(button.attribute("disabled").as_deref(), Some(""));

        setter.set(&button, "disabled", &Value::from(false));
        assert_eq!(button.attribute("disabled"), None);
    }

    #[test]
    fn text_content_replaces_children() {
        let setter = PropSetter::new();
        let p = DomNode::element("p");
        p.append_child(&DomNode::element("b"));

        setter.set(&p, "textContent", &Value::from("plain"));

        assert_eq!(p.to_html(), "<p>plain</p>");
    }
}
