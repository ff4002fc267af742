use std::cell::OnceCell;
use std::fmt::Debug;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{Handlers, Platform};
use crate::error::RenderError;
use crate::reactive::{Memo, ReadSignal, Signal};

/// How to create one kind of tag, and the handlers its props and children go
/// through.
pub struct TagOptions<P: Platform> {
    name: String,
    creator: Rc<dyn Fn() -> P::Node>,
    handlers: Rc<Handlers<P>>,
}

impl<P: Platform> TagOptions<P> {
    pub fn new(
        name: impl Into<String>,
        creator: impl Fn() -> P::Node + 'static,
        handlers: Rc<Handlers<P>>,
    ) -> Self {
        Self {
            name: name.into(),
            creator: Rc::new(creator),
            handlers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self) -> P::Node {
        (self.creator)()
    }

    pub fn handlers(&self) -> &Rc<Handlers<P>> {
        &self.handlers
    }
}

/// A prop value as handed to prop handlers.
pub enum PropValue<P: Platform> {
    Static(P::Value),
    /// Re-applied whenever the readable changes.
    Tracked(ReadSignal<P::Value>),
    Listener(Rc<dyn Fn(&P::Event)>),
}

impl<P: Platform> PropValue<P> {
    pub fn listener(f: impl Fn(&P::Event) + 'static) -> Self {
        PropValue::Listener(Rc::new(f))
    }

    pub fn tracked(f: impl Fn() -> P::Value + 'static) -> Self {
        PropValue::Tracked(ReadSignal::new(f))
    }
}

impl<P: Platform> Clone for PropValue<P> {
    fn clone(&self) -> Self {
        match self {
            PropValue::Static(value) => PropValue::Static(value.clone()),
            PropValue::Tracked(read) => PropValue::Tracked(read.clone()),
            PropValue::Listener(f) => PropValue::Listener(Rc::clone(f)),
        }
    }
}

impl<P: Platform> Debug for PropValue<P>
where
    P::Value: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            PropValue::Tracked(_) => f.write_str("Tracked"),
            PropValue::Listener(_) => f.write_str("Listener"),
        }
    }
}

/// A conditional whose output type is known but whose discriminant type is
/// erased.
pub trait DynConditional<O> {
    /// Memoized output of the winning case.
    fn branch(&self) -> Memo<Option<O>>;
}

/// A keyed list whose item type is erased.
pub trait DynList<O> {
    /// Memoized, reconciled outputs in item order.
    fn reconcile(&self) -> Memo<Vec<O>>;
}

/// One child of a tag.
pub enum Child<P: Platform> {
    Tag(Rc<TagDescriptor<P>>),
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
    Conditional(Rc<dyn DynConditional<Child<P>>>),
    List(Rc<dyn DynList<Child<P>>>),
    /// A readable producing a child. Rendered behind a single sentinel.
    Tracked(ReadSignal<Child<P>>),
}

impl<P: Platform> Child<P> {
    pub fn tracked(f: impl Fn() -> Child<P> + 'static) -> Self {
        Child::Tracked(ReadSignal::new(f))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Child::Empty)
    }
}

impl<P: Platform> Clone for Child<P> {
    fn clone(&self) -> Self {
        match self {
            Child::Tag(tag) => Child::Tag(Rc::clone(tag)),
            Child::Text(text) => Child::Text(text.clone()),
            Child::Number(n) => Child::Number(*n),
            Child::Bool(b) => Child::Bool(*b),
            Child::Empty => Child::Empty,
            Child::Conditional(c) => Child::Conditional(Rc::clone(c)),
            Child::List(l) => Child::List(Rc::clone(l)),
            Child::Tracked(read) => Child::Tracked(read.clone()),
        }
    }
}

impl<P: Platform> Debug for Child<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Child::Tag(tag) => f.debug_tuple("Tag").field(&tag.name()).finish(),
            Child::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Child::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Child::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Child::Empty => f.write_str("Empty"),
            Child::Conditional(_) => f.write_str("Conditional"),
            Child::List(_) => f.write_str("List"),
            Child::Tracked(_) => f.write_str("Tracked"),
        }
    }
}

impl<P: Platform> From<&str> for Child<P> {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl<P: Platform> From<String> for Child<P> {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl<P: Platform> From<bool> for Child<P> {
    fn from(b: bool) -> Self {
        Child::Bool(b)
    }
}

macro_rules! number_child {
    ($($ty:ty),*) => {
        $(
            impl<P: Platform> From<$ty> for Child<P> {
                fn from(n: $ty) -> Self {
                    Child::Number(n as f64)
                }
            }
        )*
    };
}

number_child!(i32, i64, u32, u64, usize, f32, f64);

impl<P: Platform> From<TagDescriptor<P>> for Child<P> {
    fn from(tag: TagDescriptor<P>) -> Self {
        Child::Tag(Rc::new(tag))
    }
}

impl<P: Platform> From<Rc<TagDescriptor<P>>> for Child<P> {
    fn from(tag: Rc<TagDescriptor<P>>) -> Self {
        Child::Tag(tag)
    }
}

impl<P: Platform, C: Into<Child<P>>> From<Option<C>> for Child<P> {
    fn from(child: Option<C>) -> Self {
        child.map_or(Child::Empty, Into::into)
    }
}

impl<P: Platform, T> From<ReadSignal<T>> for Child<P>
where
    T: Into<Child<P>> + 'static,
{
    fn from(read: ReadSignal<T>) -> Self {
        Child::Tracked(read.map(Into::into))
    }
}

impl<P: Platform, T> From<Signal<T>> for Child<P>
where
    T: Into<Child<P>> + Clone + 'static,
{
    fn from(signal: Signal<T>) -> Self {
        ReadSignal::from(signal).into()
    }
}

impl<P: Platform, T> From<Memo<T>> for Child<P>
where
    T: Into<Child<P>> + Clone + 'static,
{
    fn from(memo: Memo<T>) -> Self {
        ReadSignal::from(memo).into()
    }
}

/// A declarative description of one output node.
///
/// Props keep their insertion order. Children are fixed once attached.
///
/// # Example
///
/// ```rust
/// use trellis_core::dom::DomRenderer;
///
/// let renderer = DomRenderer::new();
/// let tag = renderer
///     .tag("p")
///     .unwrap()
///     .prop("className", "note")
///     .child("hello");
///
/// let node = renderer.build(&tag);
/// assert_eq!(node.to_html(), r#"<p class="note">hello</p>"#);
/// ```
pub struct TagDescriptor<P: Platform> {
    options: Rc<TagOptions<P>>,
    props: IndexMap<String, PropValue<P>>,
    children: OnceCell<Vec<Child<P>>>,
}

impl<P: Platform> TagDescriptor<P> {
    pub fn new(options: Rc<TagOptions<P>>) -> Self {
        Self {
            options,
            props: IndexMap::new(),
            children: OnceCell::new(),
        }
    }

    /// Set a prop. Setting the same name again replaces the value but keeps
    /// its original position.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue<P>>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn props<N, V>(mut self, props: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<PropValue<P>>,
    {
        for (name, value) in props {
            self.props.insert(name.into(), value.into());
        }
        self
    }

    /// Append a child while the descriptor is being constructed.
    pub fn child(mut self, child: impl Into<Child<P>>) -> Self {
        let child = child.into();
        match self.children.get_mut() {
            Some(children) => children.push(child),
            None => {
                let _ = self.children.set(vec![child]);
            }
        }
        self
    }

    pub fn children<C: Into<Child<P>>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        for child in children {
            self = self.child(child);
        }
        self
    }

    /// Attach the children of an already constructed descriptor.
    ///
    /// Only one attachment is allowed, and only if no children were given
    /// during construction.
    pub fn attach_children(&self, children: Vec<Child<P>>) -> Result<(), RenderError> {
        self.children
            .set(children)
            .map_err(|_| RenderError::ChildrenAlreadyAttached)
    }

    pub fn name(&self) -> &str {
        self.options.name()
    }

    pub fn options(&self) -> &Rc<TagOptions<P>> {
        &self.options
    }

    pub fn prop_entries(&self) -> impl Iterator<Item = (&str, &PropValue<P>)> {
        self.props.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get_prop(&self, name: &str) -> Option<&PropValue<P>> {
        self.props.get(name)
    }

    pub fn child_list(&self) -> &[Child<P>] {
        self.children.get().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<P: Platform> Debug for TagDescriptor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagDescriptor")
            .field("name", &self.name())
            .field("props", &self.props.keys().collect::<Vec<_>>())
            .field("children", &self.child_list())
            .finish()
    }
}
