//! Anchors: positional handles into the host tree
//!
//! An anchor bounds the contiguous run of host children one virtual node
//! currently occupies. Bounds are tracked by node identity rather than by
//! index, so edits to earlier siblings never invalidate an anchor.
//!
//! Anchors are shared handles. A component and the node it renders to hold
//! the same anchor, and the differ hands an old node's anchor to its
//! replacement; narrowing the span through one holder is seen by all of them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::error::{RenderError, RenderResult};
use crate::host::HostNode;
use crate::mount::Renderer;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Span {
    /// A non-empty run of consecutive children.
    Nodes {
        parent: HostNode,
        nodes: Vec<HostNode>,
    },
    /// An empty position directly after `after`, or at the start of `parent`.
    Point {
        parent: HostNode,
        after: Option<HostNode>,
    },
}

impl Span {
    fn parent(&self) -> HostNode {
        match self {
            Self::Nodes { parent, .. } | Self::Point { parent, .. } => *parent,
        }
    }

    fn end(&self) -> Option<HostNode> {
        match self {
            Self::Nodes { nodes, .. } => nodes.last().copied(),
            Self::Point { after, .. } => *after,
        }
    }
}

#[derive(Clone)]
pub struct Anchor {
    renderer: Renderer,
    span: Rc<RefCell<Span>>,
}

impl Anchor {
    fn with_span(renderer: &Renderer, span: Span) -> Self {
        Self {
            renderer: renderer.clone(),
            span: Rc::new(RefCell::new(span)),
        }
    }

    /// Cover children `from..to` of `parent` as they exist right now.
    pub(crate) fn spanning(
        renderer: &Renderer,
        parent: HostNode,
        from: usize,
        to: usize,
    ) -> RenderResult<Self> {
        let children = renderer.host().child_nodes(parent)?;
        if from > to || to > children.len() {
            return Err(RenderError::invalid_range(from, to, children.len()));
        }

        let span = if from == to {
            Span::Point {
                parent,
                after: from.checked_sub(1).map(|i| children[i]),
            }
        } else {
            Span::Nodes {
                parent,
                nodes: children[from..to].to_vec(),
            }
        };
        Ok(Self::with_span(renderer, span))
    }

    /// An empty anchor after the last current child of `parent`.
    pub(crate) fn at_end(renderer: &Renderer, parent: HostNode) -> RenderResult<Self> {
        let after = renderer.host().child_nodes(parent)?.last().copied();
        Ok(Self::with_span(renderer, Span::Point { parent, after }))
    }

    /// A new empty anchor directly after this anchor's current end.
    pub(crate) fn after(&self) -> Self {
        let span = self.span.borrow();
        let next = Span::Point {
            parent: span.parent(),
            after: span.end(),
        };
        Self::with_span(&self.renderer, next)
    }

    /// Replace whatever the anchor bounds with `node`, then bound exactly `node`.
    ///
    /// This is the only place the reconciler edits the attached host tree.
    pub(crate) fn clear_and_insert(&self, node: HostNode) -> RenderResult<()> {
        let host = self.renderer.host();
        let current = self.span.borrow().clone();

        let (parent, index) = match current {
            Span::Nodes { parent, nodes } => {
                let first = nodes[0];
                let index = host
                    .index_of(parent, first)?
                    .ok_or_else(|| RenderError::detached(parent, first))?;
                for old in nodes {
                    host.remove_child(parent, old)?;
                }
                (parent, index)
            }
            Span::Point { parent, after } => {
                let index = match after {
                    Some(after) => {
                        host.index_of(parent, after)?
                            .ok_or_else(|| RenderError::detached(parent, after))?
                            + 1
                    }
                    None => 0,
                };
                (parent, index)
            }
        };

        host.insert_child(parent, index, node)?;
        if self.renderer.config().trace_mutations {
            trace!(?parent, index, ?node, "anchor replaced content");
        }

        *self.span.borrow_mut() = Span::Nodes {
            parent,
            nodes: vec![node],
        };
        Ok(())
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn parent(&self) -> HostNode {
        self.span.borrow().parent()
    }

    /// Host nodes currently bounded, in order.
    pub fn nodes(&self) -> Vec<HostNode> {
        match &*self.span.borrow() {
            Span::Nodes { nodes, .. } => nodes.clone(),
            Span::Point { .. } => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(&*self.span.borrow(), Span::Point { .. })
    }

    /// The host node this anchor bounds, if it bounds exactly one.
    pub fn single_node(&self) -> Option<HostNode> {
        match &*self.span.borrow() {
            Span::Nodes { nodes, .. } if nodes.len() == 1 => Some(nodes[0]),
            _ => None,
        }
    }

    /// Whether both handles refer to the same anchor.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.span, &other.span)
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Anchor").field(&*self.span.borrow()).finish()
    }
}
