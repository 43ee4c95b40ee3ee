//! Minimal retained-mode UI rendering.
//!
//! Components describe a virtual tree; twig materializes it into a host
//! document once and afterwards patches the host by diffing each new virtual
//! tree against the previous one.
//!
//! - [`host`]: the capabilities a host document provides, and [`MemoryDocument`]
//!   as an in-process implementation
//! - [`anchor`]: positional handles every host edit goes through
//! - [`node`]: virtual nodes and their construction
//! - [`component`]: components, state, and the update cycle
//! - [`mount`]: mounting a tree into a container
//!
//! Logging goes through `tracing`; install a subscriber to see mount, remount,
//! and update decisions.

pub mod anchor;
pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod memory;
pub mod mount;
pub mod node;
mod reconcile;
pub mod state;

#[cfg(feature = "test-utils")]
pub mod proptest_strategies;

pub use anchor::Anchor;
pub use component::{
    component, function_component, Component, ComponentHandle, ComponentRef, Scope,
};
pub use config::{ConfigError, PropCountPolicy, RenderConfig};
pub use error::{RenderError, RenderResult};
pub use host::{Event, EventHandler, HostDocument, HostError, HostNode, HostResult};
pub use memory::{MemoryDocument, Mutation};
pub use mount::{mount_root, Renderer, Root};
pub use node::{
    create_node, element, event_name, text, Child, ChildCache, ElementNode, NodeKind, PropValue,
    Props, RenderedNode, TextNode, VNode, TEXT_TYPE,
};
pub use state::merge_state;
