//! In-process host document
//!
//! `MemoryDocument` is an arena-backed tree implementing [`HostDocument`]. It is
//! what tests and headless callers mount into. Every mutating call is appended
//! to a journal so callers can assert exactly which host edits a diff made.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::RenderResult;
use crate::host::{Event, EventHandler, HostDocument, HostError, HostNode, HostResult};

/// One host edit, in the order it was performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateElement { node: HostNode, tag: String },
    CreateText { node: HostNode, content: String },
    SetAttribute { element: HostNode, name: String, value: String },
    RemoveAttribute { element: HostNode, name: String },
    AddListener { element: HostNode, event: String },
    Insert { parent: HostNode, index: usize, child: HostNode },
    Remove { parent: HostNode, child: HostNode },
}

impl Mutation {
    /// Creation records do not touch an attached tree.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Insert { .. } | Self::Remove { .. })
    }
}

enum HostKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        listeners: Vec<(String, EventHandler)>,
    },
    Text(String),
}

struct NodeData {
    kind: HostKind,
    parent: Option<HostNode>,
    children: Vec<HostNode>,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<NodeData>,
    journal: Vec<Mutation>,
}

impl Arena {
    fn push(&mut self, kind: HostKind) -> HostNode {
        let id = HostNode(self.nodes.len() as u64);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn get(&self, node: HostNode) -> HostResult<&NodeData> {
        self.nodes
            .get(node.0 as usize)
            .ok_or(HostError::UnknownNode(node))
    }

    fn get_mut(&mut self, node: HostNode) -> HostResult<&mut NodeData> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or(HostError::UnknownNode(node))
    }

    fn element_mut(&mut self, node: HostNode) -> HostResult<&mut NodeData> {
        let data = self.get_mut(node)?;
        match data.kind {
            HostKind::Element { .. } => Ok(data),
            HostKind::Text(_) => Err(HostError::NotAnElement(node)),
        }
    }

    fn detach(&mut self, parent: HostNode, child: HostNode) -> HostResult<()> {
        let siblings = &mut self.get_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|c| *c == child)
            .ok_or(HostError::NotAChild { parent, child })?;
        siblings.remove(pos);
        self.get_mut(child)?.parent = None;
        self.journal.push(Mutation::Remove { parent, child });
        Ok(())
    }
}

/// Arena-backed host document.
#[derive(Default)]
pub struct MemoryDocument {
    arena: RefCell<Arena>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element to mount into.
    pub fn create_container(&self, tag: &str) -> HostResult<HostNode> {
        self.create_element(tag)
    }

    pub fn append_child(&self, parent: HostNode, child: HostNode) -> HostResult<()> {
        let len = self.child_nodes(parent)?.len();
        self.insert_child(parent, len, child)
    }

    pub fn parent_of(&self, node: HostNode) -> HostResult<Option<HostNode>> {
        Ok(self.arena.borrow().get(node)?.parent)
    }

    pub fn tag_name(&self, node: HostNode) -> HostResult<Option<String>> {
        Ok(match &self.arena.borrow().get(node)?.kind {
            HostKind::Element { tag, .. } => Some(tag.clone()),
            HostKind::Text(_) => None,
        })
    }

    pub fn attribute(&self, element: HostNode, name: &str) -> HostResult<Option<String>> {
        Ok(match &self.arena.borrow().get(element)?.kind {
            HostKind::Element { attributes, .. } => attributes.get(name).cloned(),
            HostKind::Text(_) => None,
        })
    }

    pub fn listener_count(&self, element: HostNode, event: &str) -> HostResult<usize> {
        Ok(match &self.arena.borrow().get(element)?.kind {
            HostKind::Element { listeners, .. } => {
                listeners.iter().filter(|(name, _)| name == event).count()
            }
            HostKind::Text(_) => 0,
        })
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: HostNode) -> HostResult<String> {
        let arena = self.arena.borrow();
        let mut out = String::new();
        collect_text(&arena, node, &mut out)?;
        Ok(out)
    }

    /// Serialize `node` and its subtree as HTML.
    pub fn to_html(&self, node: HostNode) -> HostResult<String> {
        let arena = self.arena.borrow();
        let mut out = String::new();
        write_html(&arena, node, &mut out)?;
        Ok(out)
    }

    /// Serialize only the children of `node`.
    pub fn inner_html(&self, node: HostNode) -> HostResult<String> {
        let arena = self.arena.borrow();
        let mut out = String::new();
        for child in &arena.get(node)?.children {
            write_html(&arena, *child, &mut out)?;
        }
        Ok(out)
    }

    /// Invoke every listener registered on `target` for `event`.
    ///
    /// Listeners are collected before any is called, so a listener may mutate
    /// this document (typically through a component state update).
    pub fn dispatch(&self, target: HostNode, event: &str) -> RenderResult<usize> {
        let handlers: Vec<EventHandler> = match &self.arena.borrow().get(target)?.kind {
            HostKind::Element { listeners, .. } => listeners
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, handler)| handler.clone())
                .collect(),
            HostKind::Text(_) => Vec::new(),
        };

        let ev = Event::new(event, target);
        for handler in &handlers {
            handler.call(&ev)?;
        }
        Ok(handlers.len())
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.arena.borrow().journal.clone()
    }

    pub fn take_mutations(&self) -> Vec<Mutation> {
        std::mem::take(&mut self.arena.borrow_mut().journal)
    }
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        _ => false,
    }
}

fn collect_text(arena: &Arena, node: HostNode, out: &mut String) -> HostResult<()> {
    let data = arena.get(node)?;
    match &data.kind {
        HostKind::Text(content) => out.push_str(content),
        HostKind::Element { .. } => {
            for child in &data.children {
                collect_text(arena, *child, out)?;
            }
        }
    }
    Ok(())
}

fn write_html(arena: &Arena, node: HostNode, out: &mut String) -> HostResult<()> {
    let data = arena.get(node)?;
    match &data.kind {
        HostKind::Text(content) => out.push_str(&escape(content, false)),
        HostKind::Element {
            tag, attributes, ..
        } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
            }
            out.push('>');
            for child in &data.children {
                write_html(arena, *child, out)?;
            }
            out.push_str(&format!("</{}>", tag));
        }
    }
    Ok(())
}

fn escape(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl HostDocument for MemoryDocument {
    fn create_element(&self, tag: &str) -> HostResult<HostNode> {
        if !is_valid_tag(tag) {
            return Err(HostError::InvalidTag(tag.to_string()));
        }
        let mut arena = self.arena.borrow_mut();
        let node = arena.push(HostKind::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
        });
        arena.journal.push(Mutation::CreateElement {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text(&self, content: &str) -> HostResult<HostNode> {
        let mut arena = self.arena.borrow_mut();
        let node = arena.push(HostKind::Text(content.to_string()));
        arena.journal.push(Mutation::CreateText {
            node,
            content: content.to_string(),
        });
        Ok(node)
    }

    fn set_attribute(&self, element: HostNode, name: &str, value: &str) -> HostResult<()> {
        let mut arena = self.arena.borrow_mut();
        if let HostKind::Element { attributes, .. } = &mut arena.element_mut(element)?.kind {
            attributes.insert(name.to_string(), value.to_string());
        }
        arena.journal.push(Mutation::SetAttribute {
            element,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&self, element: HostNode, name: &str) -> HostResult<()> {
        let mut arena = self.arena.borrow_mut();
        if let HostKind::Element { attributes, .. } = &mut arena.element_mut(element)?.kind {
            attributes.remove(name);
        }
        arena.journal.push(Mutation::RemoveAttribute {
            element,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_listener(
        &self,
        element: HostNode,
        event: &str,
        handler: EventHandler,
    ) -> HostResult<()> {
        let mut arena = self.arena.borrow_mut();
        if let HostKind::Element { listeners, .. } = &mut arena.element_mut(element)?.kind {
            listeners.push((event.to_string(), handler));
        }
        arena.journal.push(Mutation::AddListener {
            element,
            event: event.to_string(),
        });
        Ok(())
    }

    fn child_nodes(&self, parent: HostNode) -> HostResult<Vec<HostNode>> {
        Ok(self.arena.borrow().get(parent)?.children.clone())
    }

    fn insert_child(&self, parent: HostNode, index: usize, child: HostNode) -> HostResult<()> {
        let mut arena = self.arena.borrow_mut();
        arena.element_mut(parent)?;
        let previous = arena.get(child)?.parent;
        if let Some(previous) = previous {
            arena.detach(previous, child)?;
        }

        let siblings = &mut arena.get_mut(parent)?.children;
        if index > siblings.len() {
            return Err(HostError::IndexOutOfBounds {
                index,
                len: siblings.len(),
            });
        }
        siblings.insert(index, child);
        arena.get_mut(child)?.parent = Some(parent);
        arena.journal.push(Mutation::Insert {
            parent,
            index,
            child,
        });
        Ok(())
    }

    fn remove_child(&self, parent: HostNode, child: HostNode) -> HostResult<()> {
        self.arena.borrow_mut().detach(parent, child)
    }
}
