//! Reconciliation error types

use thiserror::Error;

use crate::host::{HostError, HostNode};

/// Errors raised while materializing, diffing, or updating a virtual tree.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A host primitive failed (invalid tag name, unknown node, ...)
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// A node was diffed or updated before it was ever materialized
    #[error("Node has not been materialized into the host tree")]
    NotMaterialized,

    /// An anchor refers to a host node that is no longer a child of its parent
    #[error("Anchor node {node:?} is no longer attached to {parent:?}")]
    AnchorDetached { parent: HostNode, node: HostNode },

    /// `Anchor::spanning` was asked for a range the parent does not have
    #[error("Range {from}..{to} is out of bounds for a parent with {len} children")]
    InvalidRange { from: usize, to: usize, len: usize },

    /// An element anchor was expected to bound exactly one host node
    #[error("Anchor does not bound a single host node")]
    NotSingleNode,

    /// A weak component reference outlived its component
    #[error("Component has been dropped")]
    ComponentDropped,
}

/// Specialized Result type for reconciliation
pub type RenderResult<T> = Result<T, RenderError>;

impl RenderError {
    pub fn detached(parent: HostNode, node: HostNode) -> Self {
        Self::AnchorDetached { parent, node }
    }

    pub fn invalid_range(from: usize, to: usize, len: usize) -> Self {
        Self::InvalidRange { from, to, len }
    }

    /// Whether the error originated in the host binding rather than the reconciler
    pub fn is_host_error(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}
