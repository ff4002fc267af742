use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use super::descriptor::{TagDescriptor, TagOptions};
use super::{Handlers, Platform};
use crate::error::RenderError;

/// Registration table from tag names to their options.
///
/// All tags of one catalog share the same handler chains.
pub struct TagCatalog<P: Platform> {
    handlers: Rc<Handlers<P>>,
    tags: IndexMap<String, Rc<TagOptions<P>>>,
}

impl<P: Platform> TagCatalog<P> {
    pub fn new(handlers: Rc<Handlers<P>>) -> Self {
        Self {
            handlers,
            tags: IndexMap::new(),
        }
    }

    /// Register a tag. Registering a name again replaces its creator.
    pub fn register(&mut self, name: &str, creator: impl Fn() -> P::Node + 'static) -> &mut Self {
        let options = TagOptions::new(name, creator, Rc::clone(&self.handlers));
        self.tags.insert(name.to_string(), Rc::new(options));
        self
    }

    /// Start a descriptor for a registered tag.
    pub fn tag(&self, name: &str) -> Result<TagDescriptor<P>, RenderError> {
        match self.tags.get(name) {
            Some(options) => Ok(TagDescriptor::new(Rc::clone(options))),
            None => {
                debug!(name, "tag not in catalog");
                Err(RenderError::UnknownTag(name.to_string()))
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn handlers(&self) -> &Rc<Handlers<P>> {
        &self.handlers
    }
}
