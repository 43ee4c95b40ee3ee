//! Mounting a virtual tree into a host container
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use twig::{element, mount_root, text, MemoryDocument, Props};
//!
//! let doc = Rc::new(MemoryDocument::new());
//! let app = doc.create_container("main")?;
//!
//! let root = mount_root(
//!     element("div", Props::new(), vec![text("a"), text("b")]),
//!     doc.clone(),
//!     app,
//! )?;
//! root.update(element("div", Props::new(), vec![text("a"), text("b"), text("c")]))?;
//!
//! assert_eq!(doc.inner_html(app)?, "<div>abc</div>");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::anchor::Anchor;
use crate::component::ComponentHandle;
use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::host::{HostDocument, HostNode};
use crate::node::{RenderedNode, VNode};
use crate::reconcile;

struct RendererInner {
    host: Rc<dyn HostDocument>,
    config: RenderConfig,
}

/// A host binding plus the configuration the reconciler runs with.
///
/// Every anchor created under a renderer shares it.
#[derive(Clone)]
pub struct Renderer(Rc<RendererInner>);

impl Renderer {
    pub fn new(host: Rc<dyn HostDocument>, config: RenderConfig) -> Self {
        Self(Rc::new(RendererInner { host, config }))
    }

    pub fn host(&self) -> &dyn HostDocument {
        self.0.host.as_ref()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.0.config
    }

    /// Replace whatever `container` holds with `node`.
    pub fn mount(&self, node: VNode, container: HostNode) -> RenderResult<Root> {
        let existing = self.host().child_nodes(container)?.len();
        let anchor = Anchor::spanning(self, container, 0, existing)?;
        debug!(?container, existing, "mounting root");

        let tree = reconcile::materialize(&node, &anchor)?;
        Ok(Root {
            container,
            anchor,
            node: RefCell::new(node),
            tree: RefCell::new(tree),
        })
    }
}

/// Mount `node` into `container` with the default configuration.
pub fn mount_root(
    node: VNode,
    host: Rc<dyn HostDocument>,
    container: HostNode,
) -> RenderResult<Root> {
    Renderer::new(host, RenderConfig::default()).mount(node, container)
}

/// A mounted tree.
#[derive(Debug)]
pub struct Root {
    container: HostNode,
    anchor: Anchor,
    node: RefCell<VNode>,
    tree: RefCell<RenderedNode>,
}

impl Root {
    pub fn container(&self) -> HostNode {
        self.container
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// The mounted root component, if the root is one.
    pub fn component(&self) -> Option<ComponentHandle> {
        self.node.borrow().as_component().cloned()
    }

    /// The concrete tree currently realized under the root.
    pub fn tree(&self) -> RenderedNode {
        // A root component may have re-rendered itself since the last update.
        self.component()
            .and_then(|component| component.tree())
            .unwrap_or_else(|| self.tree.borrow().clone())
    }

    /// Render `node` and patch the mounted tree toward it.
    pub fn update(&self, node: VNode) -> RenderResult<()> {
        let old = self.tree();
        let new = node.virtual_tree();
        reconcile::diff(&old, &new)?;

        *self.tree.borrow_mut() = new;
        *self.node.borrow_mut() = node;
        Ok(())
    }
}
