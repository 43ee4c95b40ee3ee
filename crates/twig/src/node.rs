//! Virtual node model
//!
//! A [`VNode`] is what user code builds: an element, a text node, or a
//! component instance. Resolving a `VNode` ([`VNode::virtual_tree`]) renders
//! every component down to the element or text it produces and yields a
//! [`RenderedNode`]. Rendered trees are what gets materialized and diffed, so
//! a component can never reach the differ.

use std::cell::RefCell;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::anchor::Anchor;
use crate::component::{Component, ComponentHandle, FnComponent, Owner, Scope};
use crate::host::{EventHandler, HostNode};

/// Node type reported for text nodes by the same-node test.
pub const TEXT_TYPE: &str = "#text";

const EVENT_PREFIX: &str = "on";

/// Event name for a prop key of the form `on<Event>`, first letter lower-cased.
///
/// `onclick` and `onClick` both map to `click`; a bare `on` is not an event.
pub fn event_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix(EVENT_PREFIX)?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}

/// String-keyed props of an element or component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(BTreeMap<String, PropValue>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Register `handler` for `event` (stored under `on<event>`).
    pub fn on(self, event: &str, handler: EventHandler) -> Self {
        self.with(format!("{}{}", EVENT_PREFIX, event), handler)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PropValue> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Props {
    type Item = (&'a String, &'a PropValue);
    type IntoIter = btree_map::Iter<'a, String, PropValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// State of an element's resolved child list.
#[derive(Debug, Clone, Default)]
pub enum ChildCache {
    /// Not computed since creation or the last invalidation.
    #[default]
    Stale,
    /// Valid until the next full render pass replaces this node.
    Valid(Vec<RenderedNode>),
}

#[derive(Debug)]
pub struct ElementNode {
    tag: String,
    props: Props,
    children: Vec<VNode>,
    vchildren: Rc<RefCell<ChildCache>>,
    anchor: RefCell<Option<Anchor>>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>, props: Props, children: Vec<VNode>) -> Self {
        Self {
            tag: tag.into(),
            props,
            children,
            vchildren: Rc::new(RefCell::new(ChildCache::Stale)),
            anchor: RefCell::new(None),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Children as declared, before components are rendered.
    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor.borrow().clone()
    }

    pub(crate) fn set_anchor(&self, anchor: Anchor) {
        *self.anchor.borrow_mut() = Some(anchor);
    }

    pub fn has_valid_children(&self) -> bool {
        matches!(&*self.vchildren.borrow(), ChildCache::Valid(_))
    }

    /// Drop the resolved children; the next access resolves them again.
    pub fn invalidate_children(&self) {
        *self.vchildren.borrow_mut() = ChildCache::Stale;
    }

    /// Resolved children, computed on first access and cached.
    ///
    /// A nested component that later updates itself writes its new tree
    /// back into its entry here.
    pub fn rendered_children(&self) -> Vec<RenderedNode> {
        if let ChildCache::Valid(children) = &*self.vchildren.borrow() {
            return children.clone();
        }
        let children = resolve_children(&self.children, &self.vchildren);
        *self.vchildren.borrow_mut() = ChildCache::Valid(children.clone());
        children
    }

    /// A fresh snapshot of this element with its children resolved.
    fn resolve(&self) -> Rc<ElementNode> {
        let vchildren = Rc::new(RefCell::new(ChildCache::Stale));
        let resolved = resolve_children(&self.children, &vchildren);
        *vchildren.borrow_mut() = ChildCache::Valid(resolved);
        Rc::new(Self {
            tag: self.tag.clone(),
            props: self.props.clone(),
            children: self.children.clone(),
            vchildren,
            anchor: RefCell::new(None),
        })
    }
}

fn resolve_children(children: &[VNode], cache: &Rc<RefCell<ChildCache>>) -> Vec<RenderedNode> {
    let resolved = children.iter().map(VNode::virtual_tree).collect();
    for (index, child) in children.iter().enumerate() {
        if let Some(component) = child.as_component() {
            component.set_owner(Owner::Element(Rc::downgrade(cache), index));
        }
    }
    resolved
}

#[derive(Debug)]
pub struct TextNode {
    content: String,
    anchor: RefCell<Option<Anchor>>,
}

impl TextNode {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            anchor: RefCell::new(None),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor.borrow().clone()
    }

    pub(crate) fn set_anchor(&self, anchor: Anchor) {
        *self.anchor.borrow_mut() = Some(anchor);
    }
}

#[derive(Debug, Clone)]
pub enum VNode {
    Element(Rc<ElementNode>),
    Text(Rc<TextNode>),
    Component(ComponentHandle),
}

impl VNode {
    /// Render components until a concrete node is reached.
    ///
    /// Every call is a full render pass: elements and text are copied into a
    /// fresh snapshot, so the nodes of a previously materialized tree keep
    /// their anchors and cached children. Components met on the way cache the
    /// tree they produced so they can update themselves later.
    pub fn virtual_tree(&self) -> RenderedNode {
        match self {
            Self::Element(element) => RenderedNode::Element(element.resolve()),
            Self::Text(text) => RenderedNode::Text(Rc::new(TextNode::new(text.content.clone()))),
            Self::Component(component) => component.adopt(),
        }
    }

    pub fn as_component(&self) -> Option<&ComponentHandle> {
        match self {
            Self::Component(component) => Some(component),
            _ => None,
        }
    }
}

/// A concrete node of a resolved virtual tree.
#[derive(Debug, Clone)]
pub enum RenderedNode {
    Element(Rc<ElementNode>),
    Text(Rc<TextNode>),
}

impl RenderedNode {
    /// Tag name, or [`TEXT_TYPE`] for text.
    pub fn node_type(&self) -> &str {
        match self {
            Self::Element(element) => element.tag(),
            Self::Text(_) => TEXT_TYPE,
        }
    }

    pub fn anchor(&self) -> Option<Anchor> {
        match self {
            Self::Element(element) => element.anchor(),
            Self::Text(text) => text.anchor(),
        }
    }

    pub(crate) fn set_anchor(&self, anchor: Anchor) {
        match self {
            Self::Element(element) => element.set_anchor(anchor),
            Self::Text(text) => text.set_anchor(anchor),
        }
    }

    /// The host node currently realizing this node, once materialized.
    pub fn host_node(&self) -> Option<HostNode> {
        self.anchor().and_then(|anchor| anchor.single_node())
    }

    pub fn as_element(&self) -> Option<&Rc<ElementNode>> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Element(a), Self::Element(b)) => Rc::ptr_eq(a, b),
            (Self::Text(a), Self::Text(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Child content accepted by the node constructors.
///
/// Strings become text nodes, `None` is skipped, and lists are flattened in
/// order.
#[derive(Debug, Clone)]
pub enum Child {
    Node(VNode),
    Text(String),
    List(Vec<Child>),
    Empty,
}

impl Child {
    pub fn flatten(self) -> Vec<VNode> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<VNode>) {
        match self {
            Self::Node(node) => out.push(node),
            Self::Text(content) => out.push(text(content)),
            Self::List(children) => children.into_iter().for_each(|c| c.flatten_into(out)),
            Self::Empty => {}
        }
    }
}

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Child {
    fn from(content: &str) -> Self {
        Self::Text(content.to_string())
    }
}

impl From<String> for Child {
    fn from(content: String) -> Self {
        Self::Text(content)
    }
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(child: Option<T>) -> Self {
        child.map_or(Self::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(children: Vec<T>) -> Self {
        Self::List(children.into_iter().map(Into::into).collect())
    }
}

pub type ComponentFactory = Rc<dyn Fn() -> Box<dyn Component>>;

/// What [`create_node`] builds: a host element or a component instance.
#[derive(Clone)]
pub enum NodeKind {
    Tag(String),
    Component(ComponentFactory),
}

impl NodeKind {
    pub fn component<C: Component + Default>() -> Self {
        Self::Component(Rc::new(|| Box::new(C::default())))
    }

    pub fn function<F>(render: F) -> Self
    where
        F: Fn(&Scope<'_>) -> VNode + Clone + 'static,
    {
        Self::Component(Rc::new(move || Box::new(FnComponent::new(render.clone()))))
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Self::Component(_) => f.write_str("Component(..)"),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(tag: &str) -> Self {
        Self::Tag(tag.to_string())
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        Self::Tag(tag)
    }
}

/// Build a virtual node: a tag gives an element, a component kind a fresh
/// component instance owning `props` and `children` as its slot content.
pub fn create_node(kind: impl Into<NodeKind>, props: Props, children: impl Into<Child>) -> VNode {
    let children = children.into().flatten();
    match kind.into() {
        NodeKind::Tag(tag) => VNode::Element(Rc::new(ElementNode::new(tag, props, children))),
        NodeKind::Component(factory) => {
            VNode::Component(ComponentHandle::new(factory(), props, children))
        }
    }
}

pub fn element(tag: &str, props: Props, children: impl Into<Child>) -> VNode {
    create_node(tag, props, children)
}

pub fn text(content: impl Into<String>) -> VNode {
    VNode::Text(Rc::new(TextNode::new(content)))
}
