//! In-memory DOM nodes.
//!
//! A small tree with the operations rendering needs: element, text and
//! comment nodes, sibling-relative insertion, attributes, native properties,
//! inline style and event listeners. `DomNode` is a handle; clones point at
//! the same node and equality is identity.

use std::cell::RefCell;
use std::fmt::{self, Debug, Write};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::value::Value;

/// A DOM event as delivered to listeners.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub target: DomNode,
}

pub type Listener = Rc<dyn Fn(&Event)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Element {
        tag: String,
        namespace: Option<String>,
    },
    Text,
    Comment,
}

struct NodeData {
    node_type: NodeType,
    /// Character data of text and comment nodes.
    data: RefCell<String>,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<DomNode>>,
    attributes: RefCell<IndexMap<String, String>>,
    properties: RefCell<IndexMap<String, Value>>,
    style: RefCell<IndexMap<String, String>>,
    listeners: RefCell<Vec<(String, Listener)>>,
}

#[derive(Clone)]
pub struct DomNode(Rc<NodeData>);

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl DomNode {
    fn with_type(node_type: NodeType, data: String) -> Self {
        Self(Rc::new(NodeData {
            node_type,
            data: RefCell::new(data),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            attributes: RefCell::new(IndexMap::new()),
            properties: RefCell::new(IndexMap::new()),
            style: RefCell::new(IndexMap::new()),
            listeners: RefCell::new(Vec::new()),
        }))
    }

    pub fn element(tag: &str) -> Self {
        Self::with_type(
            NodeType::Element {
                tag: tag.to_string(),
                namespace: None,
            },
            String::new(),
        )
    }

    pub fn element_ns(namespace: &str, tag: &str) -> Self {
        Self::with_type(
            NodeType::Element {
                tag: tag.to_string(),
                namespace: Some(namespace.to_string()),
            },
            String::new(),
        )
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::with_type(NodeType::Text, data.into())
    }

    pub fn comment(data: impl Into<String>) -> Self {
        Self::with_type(NodeType::Comment, data.into())
    }

    pub fn node_type(&self) -> &NodeType {
        &self.0.node_type
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.0.node_type {
            NodeType::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match &self.0.node_type {
            NodeType::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.node_type, NodeType::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        self.0.node_type == NodeType::Text
    }

    pub fn is_comment(&self) -> bool {
        self.0.node_type == NodeType::Comment
    }

    /// Character data of a text or comment node, empty for elements.
    pub fn data(&self) -> String {
        self.0.data.borrow().clone()
    }

    pub fn set_data(&self, data: impl Into<String>) {
        *self.0.data.borrow_mut() = data.into();
    }

    // ------------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------------

    pub fn parent(&self) -> Option<DomNode> {
        self.0.parent.borrow().upgrade().map(DomNode)
    }

    pub fn children(&self) -> Vec<DomNode> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn first_child(&self) -> Option<DomNode> {
        self.0.children.borrow().first().cloned()
    }

    fn index_in_parent(&self) -> Option<(DomNode, usize)> {
        let parent = self.parent()?;
        let index = parent.0.children.borrow().iter().position(|c| c == self)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self) -> Option<DomNode> {
        let (parent, index) = self.index_in_parent()?;
        let sibling = parent.0.children.borrow().get(index + 1).cloned();
        sibling
    }

    pub fn previous_sibling(&self) -> Option<DomNode> {
        let (parent, index) = self.index_in_parent()?;
        let sibling = index
            .checked_sub(1)
            .and_then(|i| parent.0.children.borrow().get(i).cloned());
        sibling
    }

    /// Detach from the current parent, if any.
    pub fn remove(&self) {
        if let Some((parent, index)) = self.index_in_parent() {
            parent.0.children.borrow_mut().remove(index);
        }
        *self.0.parent.borrow_mut() = Weak::new();
    }

    pub fn append_child(&self, child: &DomNode) {
        child.remove();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.clone());
    }

    /// Insert `node` right after this one. Does nothing without a parent.
    pub fn after(&self, node: &DomNode) {
        if self.parent().is_none() || node == self {
            return;
        }
        node.remove();
        if let Some((parent, index)) = self.index_in_parent() {
            *node.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
            parent.0.children.borrow_mut().insert(index + 1, node.clone());
        }
    }

    /// Put `node` where this one is. Does nothing without a parent.
    pub fn replace_with(&self, node: &DomNode) {
        if node == self {
            return;
        }
        if self.parent().is_none() {
            return;
        }
        node.remove();
        if let Some((parent, index)) = self.index_in_parent() {
            *node.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
            parent.0.children.borrow_mut()[index] = node.clone();
            *self.0.parent.borrow_mut() = Weak::new();
        }
    }

    // ------------------------------------------------------------------------
    // Attributes, properties, style
    // ------------------------------------------------------------------------

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        self.0
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow().get(name).cloned()
    }

    pub fn remove_attribute(&self, name: &str) {
        self.0.attributes.borrow_mut().shift_remove(name);
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.0.attributes.borrow().keys().cloned().collect()
    }

    pub fn set_property(&self, name: &str, value: Value) {
        self.0
            .properties
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.0.properties.borrow().get(name).cloned()
    }

    /// Current input value: the `value` property, else the attribute.
    pub fn value(&self) -> String {
        match self.property("value") {
            Some(value) => value.to_string(),
            None => self.attribute("value").unwrap_or_default(),
        }
    }

    pub fn set_style(&self, name: &str, value: impl Into<String>) {
        self.0
            .style
            .borrow_mut()
            .insert(name.to_string(), value.into());
    }

    pub fn style(&self, name: &str) -> Option<String> {
        self.0.style.borrow().get(name).cloned()
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    pub fn add_event_listener(&self, name: &str, listener: Listener) {
        self.0
            .listeners
            .borrow_mut()
            .push((name.to_string(), listener));
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.0
            .listeners
            .borrow()
            .iter()
            .filter(|(event, _)| event == name)
            .count()
    }

    /// Deliver an event targeting this node to its own listeners.
    pub fn dispatch(&self, name: &str) {
        let listeners: Vec<Listener> = self
            .0
            .listeners
            .borrow()
            .iter()
            .filter(|(event, _)| event == name)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        let event = Event {
            name: name.to_string(),
            target: self.clone(),
        };
        for listener in listeners {
            listener(&event);
        }
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        match &self.0.node_type {
            NodeType::Text => self.data(),
            NodeType::Comment => String::new(),
            NodeType::Element { .. } => self
                .0
                .children
                .borrow()
                .iter()
                .map(DomNode::text_content)
                .collect(),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) -> fmt::Result {
        match &self.0.node_type {
            NodeType::Text => out.push_str(&escape(&self.0.data.borrow(), false)),
            NodeType::Comment => write!(out, "<!--{}-->", self.0.data.borrow())?,
            NodeType::Element { tag, .. } => {
                write!(out, "<{tag}")?;
                for (name, value) in self.0.attributes.borrow().iter() {
                    if name == "style" && !self.0.style.borrow().is_empty() {
                        continue;
                    }
                    write!(out, " {}=\"{}\"", name, escape(value, true))?;
                }
                let style = self.0.style.borrow();
                if !style.is_empty() {
                    let css: Vec<String> = style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    write!(out, " style=\"{}\"", escape(&css.join("; "), true))?;
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&tag.as_str()) && self.child_count() == 0 {
                    return Ok(());
                }
                for child in self.0.children.borrow().iter() {
                    child.write_html(out)?;
                }
                write!(out, "</{tag}>")?;
            }
        }
        Ok(())
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl PartialEq for DomNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DomNode {}

impl Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.node_type {
            NodeType::Element { tag, .. } => write!(f, "<{tag}> ({} children)", self.child_count()),
            NodeType::Text => write!(f, "#text {:?}", self.0.data.borrow()),
            NodeType::Comment => write!(f, "<!--{}-->", self.0.data.borrow()),
        }
    }
}
