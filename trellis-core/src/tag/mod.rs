//! Tag Trees
//!
//! A tag descriptor is a declarative description of one output node: how to
//! create it, which props to apply and which children to attach. The builder
//! turns descriptors into live nodes.
//!
//! Everything here is generic over a [`Platform`], which names the output
//! node, prop value and event types. The platform plugs in through
//! [`Handlers`]: ordered chains of prop handlers and child handlers. The
//! first handler that claims a prop or child wins.

mod builder;
mod catalog;
mod descriptor;

use std::rc::Rc;

use smallvec::SmallVec;

pub use builder::Root;
pub use catalog::TagCatalog;
pub use descriptor::{Child, DynConditional, DynList, PropValue, TagDescriptor, TagOptions};

/// An output target for tag trees.
pub trait Platform: 'static {
    /// A node in the output tree. Cloning yields another handle to the same node.
    type Node: Clone + 'static;
    /// A prop value.
    type Value: Clone + 'static;
    /// What event listeners receive.
    type Event: 'static;
}

/// Nodes produced by resolving one child. Usually one to three.
pub type Nodes<P> = SmallVec<[<P as Platform>::Node; 4]>;

/// Whether a prop handler took care of a prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropOutcome {
    Handled,
    Unhandled,
}

/// Recursively resolves a nested child with the same handlers and root.
pub type BuildChild<P> = Rc<dyn Fn(&Child<P>) -> Option<Nodes<P>>>;

pub type PropHandler<P> =
    Rc<dyn Fn(&<P as Platform>::Node, &str, &PropValue<P>) -> PropOutcome>;

pub type ChildHandler<P> = Rc<dyn Fn(&Child<P>, &BuildChild<P>) -> Option<Nodes<P>>>;

/// The handler chains shared by every tag of one catalog.
pub struct Handlers<P: Platform> {
    pub props: Vec<PropHandler<P>>,
    pub children: Vec<ChildHandler<P>>,
}

impl<P: Platform> Handlers<P> {
    pub fn new() -> Self {
        Self {
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_prop(
        mut self,
        handler: impl Fn(&P::Node, &str, &PropValue<P>) -> PropOutcome + 'static,
    ) -> Self {
        self.props.push(Rc::new(handler));
        self
    }

    pub fn with_child(
        mut self,
        handler: impl Fn(&Child<P>, &BuildChild<P>) -> Option<Nodes<P>> + 'static,
    ) -> Self {
        self.children.push(Rc::new(handler));
        self
    }
}

impl<P: Platform> Default for Handlers<P> {
    fn default() -> Self {
        Self::new()
    }
}
