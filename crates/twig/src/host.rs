//! Host tree capabilities
//!
//! The reconciler never builds host content itself. Everything it needs from
//! the host document (creating elements and text, attributes, listeners, and
//! child list edits) goes through [`HostDocument`]. Bindings use interior
//! mutability because listeners re-enter the update cycle while the host is
//! dispatching an event.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::error::RenderResult;

/// Opaque handle to a node owned by a [`HostDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNode(pub u64);

/// Failures reported by a host binding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Invalid tag name: {0:?}")]
    InvalidTag(String),

    #[error("Unknown host node {0:?}")]
    UnknownNode(HostNode),

    #[error("Host node {0:?} is not an element")]
    NotAnElement(HostNode),

    #[error("Host node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: HostNode, child: HostNode },

    #[error("Index {index} is out of bounds for {len} children")]
    IndexOutOfBounds { index: usize, len: usize },
}

pub type HostResult<T> = Result<T, HostError>;

/// An event delivered to a registered listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub target: HostNode,
}

impl Event {
    pub fn new(name: impl Into<String>, target: HostNode) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

type HandlerFn = dyn Fn(&Event) -> RenderResult<()>;

/// A shared event callback.
///
/// Equality is identity: two handlers are equal only when they are clones of
/// the same callback. A closure recreated by a later render is a different
/// handler even if its body is the same.
#[derive(Clone)]
pub struct EventHandler(Rc<HandlerFn>);

impl EventHandler {
    pub fn new(f: impl Fn(&Event) -> RenderResult<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) -> RenderResult<()> {
        (self.0)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Capabilities a host binding must provide.
pub trait HostDocument {
    fn create_element(&self, tag: &str) -> HostResult<HostNode>;

    fn create_text(&self, content: &str) -> HostResult<HostNode>;

    fn set_attribute(&self, element: HostNode, name: &str, value: &str) -> HostResult<()>;

    fn remove_attribute(&self, element: HostNode, name: &str) -> HostResult<()>;

    fn add_listener(&self, element: HostNode, event: &str, handler: EventHandler)
        -> HostResult<()>;

    /// Current children of `parent`, in order.
    fn child_nodes(&self, parent: HostNode) -> HostResult<Vec<HostNode>>;

    /// Insert `child` at `index`, detaching it from any previous parent first.
    fn insert_child(&self, parent: HostNode, index: usize, child: HostNode) -> HostResult<()>;

    fn remove_child(&self, parent: HostNode, child: HostNode) -> HostResult<()>;

    fn index_of(&self, parent: HostNode, child: HostNode) -> HostResult<Option<usize>> {
        Ok(self.child_nodes(parent)?.iter().position(|c| *c == child))
    }
}
