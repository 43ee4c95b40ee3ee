//! Components and their state/update cycle
//!
//! A component supplies one operation, [`Component::render`]. The props,
//! slot children, state, cached tree, and anchor live in the shared
//! [`ComponentHandle`] the library wraps around it.
//!
//! Updates are synchronous: [`ComponentHandle::set_state`] merges the partial
//! state, renders a new virtual tree, diffs it against the cached one, and
//! returns once the host tree is patched.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::debug;

use crate::anchor::Anchor;
use crate::error::{RenderError, RenderResult};
use crate::host::{Event, EventHandler};
use crate::node::{Child, ChildCache, PropValue, Props, RenderedNode, VNode};
use crate::reconcile;
use crate::state::merge_state;

pub trait Component: 'static {
    /// Produce the child virtual node for the current props, state, and slot.
    fn render(&self, scope: &Scope<'_>) -> VNode;

    /// State the component starts with; `None` leaves it absent.
    fn initial_state(&self) -> Option<Value> {
        None
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Adapts a closure into a [`Component`].
pub(crate) struct FnComponent<F> {
    render: F,
}

impl<F> FnComponent<F> {
    pub(crate) fn new(render: F) -> Self {
        Self { render }
    }
}

impl<F> Component for FnComponent<F>
where
    F: Fn(&Scope<'_>) -> VNode + 'static,
{
    fn render(&self, scope: &Scope<'_>) -> VNode {
        (self.render)(scope)
    }

    fn name(&self) -> &'static str {
        "fn"
    }
}

pub(crate) struct ComponentInner {
    component: Box<dyn Component>,
    props: Props,
    children: Vec<VNode>,
    state: RefCell<Option<Value>>,
    tree: RefCell<Option<RenderedNode>>,
    owner: RefCell<Option<Owner>>,
    anchor: RefCell<Option<Anchor>>,
}

/// The other place a component's tree is cached: a slot in the resolved
/// children of an element, or the component that rendered straight to it.
#[derive(Clone)]
pub(crate) enum Owner {
    Element(Weak<RefCell<ChildCache>>, usize),
    Component(Weak<ComponentInner>),
}

/// Shared handle to a component instance.
#[derive(Clone)]
pub struct ComponentHandle(Rc<ComponentInner>);

/// Non-owning handle, safe to capture in event handlers.
#[derive(Clone)]
pub struct ComponentRef(Weak<ComponentInner>);

impl ComponentHandle {
    pub(crate) fn new(component: Box<dyn Component>, props: Props, children: Vec<VNode>) -> Self {
        let state = component.initial_state();
        Self(Rc::new(ComponentInner {
            component,
            props,
            children,
            state: RefCell::new(state),
            tree: RefCell::new(None),
            owner: RefCell::new(None),
            anchor: RefCell::new(None),
        }))
    }

    pub fn name(&self) -> &'static str {
        self.0.component.name()
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    /// Slot content supplied by whoever created this component.
    pub fn children(&self) -> &[VNode] {
        &self.0.children
    }

    pub fn state(&self) -> Option<Value> {
        self.0.state.borrow().clone()
    }

    /// The tree produced by the last render pass that reached the host.
    pub fn tree(&self) -> Option<RenderedNode> {
        self.0.tree.borrow().clone()
    }

    /// Where this component currently lives in the host tree.
    pub fn anchor(&self) -> Option<Anchor> {
        let recorded = self.0.anchor.borrow().clone();
        recorded.or_else(|| self.tree().and_then(|tree| tree.anchor()))
    }

    pub fn downgrade(&self) -> ComponentRef {
        ComponentRef(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn render(&self) -> VNode {
        let scope = Scope { component: self };
        self.0.component.render(&scope)
    }

    /// Render until a concrete node is reached, without caching the result.
    pub fn virtual_tree(&self) -> RenderedNode {
        self.render().virtual_tree()
    }

    fn render_tree(&self) -> RenderedNode {
        let node = self.render();
        if let Some(inner) = node.as_component() {
            inner.set_owner(Owner::Component(Rc::downgrade(&self.0)));
        }
        node.virtual_tree()
    }

    pub(crate) fn set_owner(&self, owner: Owner) {
        *self.0.owner.borrow_mut() = Some(owner);
    }

    /// Keep `tree` as the current tree here and in every cache holding it.
    fn store_tree(&self, tree: RenderedNode) {
        *self.0.tree.borrow_mut() = Some(tree.clone());
        let owner = self.0.owner.borrow().clone();
        match owner {
            Some(Owner::Element(cache, index)) => {
                if let Some(cache) = cache.upgrade() {
                    if let ChildCache::Valid(children) = &mut *cache.borrow_mut() {
                        if let Some(slot) = children.get_mut(index) {
                            *slot = tree;
                        }
                    }
                }
            }
            Some(Owner::Component(outer)) => {
                if let Some(outer) = outer.upgrade() {
                    ComponentHandle(outer).store_tree(tree);
                }
            }
            None => {}
        }
    }

    /// Render and keep the result as this component's tree.
    pub(crate) fn adopt(&self) -> RenderedNode {
        let tree = self.render_tree();
        *self.0.tree.borrow_mut() = Some(tree.clone());
        tree
    }

    pub(crate) fn record_mount(&self, anchor: Anchor) {
        *self.0.anchor.borrow_mut() = Some(anchor);
    }

    /// Merge `partial` into the state, then re-render and patch the host.
    pub fn set_state(&self, partial: Value) -> RenderResult<()> {
        let next = merge_state(self.0.state.borrow().as_ref(), &partial);
        *self.0.state.borrow_mut() = Some(next);
        self.update()
    }

    /// Re-render and diff against the cached tree.
    pub fn update(&self) -> RenderResult<()> {
        let old = self.tree().ok_or(RenderError::NotMaterialized)?;
        let new = self.render_tree();
        debug!(component = self.name(), node = new.node_type(), "updating component");

        reconcile::diff(&old, &new)?;
        self.store_tree(new);
        Ok(())
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("name", &self.name())
            .field("props", &self.0.props)
            .field("state", &*self.0.state.borrow())
            .finish_non_exhaustive()
    }
}

impl ComponentRef {
    pub fn upgrade(&self) -> Option<ComponentHandle> {
        self.0.upgrade().map(ComponentHandle)
    }

    pub fn state(&self) -> Option<Value> {
        self.upgrade().and_then(|component| component.state())
    }

    pub fn set_state(&self, partial: Value) -> RenderResult<()> {
        self.upgrade()
            .ok_or(RenderError::ComponentDropped)?
            .set_state(partial)
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(component) => write!(f, "ComponentRef({})", component.name()),
            None => f.write_str("ComponentRef(<dropped>)"),
        }
    }
}

/// What a component sees while rendering.
pub struct Scope<'a> {
    component: &'a ComponentHandle,
}

impl<'a> Scope<'a> {
    pub fn props(&self) -> &'a Props {
        self.component.props()
    }

    pub fn prop(&self, key: &str) -> Option<&'a PropValue> {
        self.component.props().get(key)
    }

    pub fn state(&self) -> Option<Value> {
        self.component.state()
    }

    /// State value at a JSON pointer such as `/todo/0/title`.
    pub fn state_at(&self, pointer: &str) -> Option<Value> {
        self.component
            .0
            .state
            .borrow()
            .as_ref()
            .and_then(|state| state.pointer(pointer).cloned())
    }

    /// Slot content, ready to be placed in the rendered tree.
    pub fn children(&self) -> Vec<VNode> {
        self.component.children().to_vec()
    }

    pub fn handle(&self) -> ComponentRef {
        self.component.downgrade()
    }

    /// An event handler bound to this component.
    pub fn handler<F>(&self, f: F) -> EventHandler
    where
        F: Fn(&ComponentRef, &Event) -> RenderResult<()> + 'static,
    {
        let this = self.handle();
        EventHandler::new(move |event| f(&this, event))
    }
}

/// Instantiate `component` with `props` and slot `children`.
pub fn component<C: Component>(component: C, props: Props, children: impl Into<Child>) -> VNode {
    VNode::Component(ComponentHandle::new(
        Box::new(component),
        props,
        children.into().flatten(),
    ))
}

/// Use a plain render function as a component.
pub fn function_component<F>(render: F, props: Props, children: impl Into<Child>) -> VNode
where
    F: Fn(&Scope<'_>) -> VNode + 'static,
{
    component(FnComponent::new(render), props, children)
}
