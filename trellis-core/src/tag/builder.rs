//! Tag Builder
//!
//! Turns descriptors into live nodes:
//!
//! 1. Create the node with the tag's creator
//! 2. Offer every prop to the prop handlers, in insertion order
//! 3. Resolve every child: nested tags are built recursively, anything else
//!    goes to the child handlers
//! 4. Append the resolved nodes in order

use std::fmt::Debug;
use std::rc::Rc;

use smallvec::smallvec;
use tracing::{debug, trace, warn};

use super::descriptor::{Child, TagDescriptor};
use super::{BuildChild, Handlers, Nodes, Platform, PropOutcome};
use crate::config::RenderConfig;
use crate::reactive::Scope;

type Append<P> = Box<dyn Fn(&<P as Platform>::Node, &<P as Platform>::Node)>;

/// What build closures need. Kept apart from [`Root`] so that effects created
/// during a build never hold on to the root's scope.
struct RootShared<P: Platform> {
    append: Append<P>,
    config: RenderConfig,
}

/// Entry point for building tag trees onto one platform.
///
/// Every effect created while building is owned by the root's scope and
/// stops when the root is disposed.
pub struct Root<P: Platform> {
    shared: Rc<RootShared<P>>,
    scope: Scope,
}

impl<P: Platform> Root<P> {
    /// Create a root that attaches children with `append(parent, child)`.
    pub fn new(append: impl Fn(&P::Node, &P::Node) + 'static) -> Self {
        Self::with_config(append, RenderConfig::default())
    }

    pub fn with_config(append: impl Fn(&P::Node, &P::Node) + 'static, config: RenderConfig) -> Self {
        Self {
            shared: Rc::new(RootShared {
                append: Box::new(append),
                config,
            }),
            scope: Scope::detached(),
        }
    }

    /// Build `tag` and everything below it.
    #[tracing::instrument(level = "debug", skip_all, fields(tag = tag.name()))]
    pub fn build(&self, tag: &TagDescriptor<P>) -> P::Node {
        self.scope.run(|| build_tag(&self.shared, tag))
    }

    /// Stop every effect created by this root's builds.
    pub fn dispose(&self) {
        debug!("disposing root");
        self.scope.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        !self.scope.is_active()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.shared.config
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl<P: Platform> Debug for Root<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Root")
            .field("config", &self.shared.config)
            .field("scope", &self.scope)
            .finish()
    }
}

fn build_tag<P: Platform>(shared: &Rc<RootShared<P>>, tag: &TagDescriptor<P>) -> P::Node {
    let options = tag.options();
    let handlers = options.handlers();
    let node = options.create();

    for (name, value) in tag.prop_entries() {
        let handled = handlers
            .props
            .iter()
            .any(|handler| handler(&node, name, value) == PropOutcome::Handled);

        if !handled {
            report_unhandled(&shared.config, tag.name(), "prop", name);
        }
    }

    let mut resolved: Nodes<P> = Nodes::<P>::new();
    for child in tag.child_list() {
        match resolve_child(shared, handlers, child) {
            Some(nodes) => resolved.extend(nodes),
            None => report_unhandled(&shared.config, tag.name(), "child", &format!("{child:?}")),
        }
    }

    for child in &resolved {
        (shared.append)(&node, child);
    }

    node
}

fn resolve_child<P: Platform>(
    shared: &Rc<RootShared<P>>,
    handlers: &Rc<Handlers<P>>,
    child: &Child<P>,
) -> Option<Nodes<P>> {
    if let Child::Tag(tag) = child {
        return Some(smallvec![build_tag(shared, tag)]);
    }

    let build_child: BuildChild<P> = {
        let shared = Rc::clone(shared);
        let handlers = Rc::clone(handlers);
        Rc::new(move |child: &Child<P>| resolve_child(&shared, &handlers, child))
    };

    handlers
        .children
        .iter()
        .find_map(|handler| handler(child, &build_child))
}

fn report_unhandled(config: &RenderConfig, tag: &str, kind: &str, what: &str) {
    if config.warn_on_unhandled {
        warn!(tag, kind, what, "dropping unhandled {}", kind);
    } else {
        trace!(tag, kind, what, "dropping unhandled {}", kind);
    }
}
