//! Materializer and differ
//!
//! Both entry points are crate-private. Callers reach them through
//! [`Renderer::mount`](crate::Renderer::mount), [`Root::update`](crate::Root::update)
//! and [`ComponentHandle::set_state`](crate::ComponentHandle::set_state).

use tracing::{debug, warn};

use crate::anchor::Anchor;
use crate::config::PropCountPolicy;
use crate::error::{RenderError, RenderResult};
use crate::host::{HostDocument, HostNode};
use crate::node::{event_name, ElementNode, PropValue, Props, RenderedNode, TextNode, VNode};

const CLASS_NAME_PROP: &str = "className";
const CLASS_ATTRIBUTE: &str = "class";

/// Realize `node` into exactly the span of `anchor`.
///
/// Returns the concrete node now occupying the anchor.
pub(crate) fn materialize(node: &VNode, anchor: &Anchor) -> RenderResult<RenderedNode> {
    match node {
        VNode::Component(component) => {
            let tree = component.adopt();
            component.record_mount(anchor.clone());
            materialize_rendered(&tree, anchor)?;
            Ok(tree)
        }
        VNode::Element(element) => {
            materialize_element(element, anchor)?;
            Ok(RenderedNode::Element(element.clone()))
        }
        VNode::Text(text) => {
            materialize_text(text, anchor)?;
            Ok(RenderedNode::Text(text.clone()))
        }
    }
}

pub(crate) fn materialize_rendered(node: &RenderedNode, anchor: &Anchor) -> RenderResult<()> {
    match node {
        RenderedNode::Element(element) => materialize_element(element, anchor),
        RenderedNode::Text(text) => materialize_text(text, anchor),
    }
}

fn materialize_element(node: &ElementNode, anchor: &Anchor) -> RenderResult<()> {
    node.set_anchor(anchor.clone());
    let renderer = anchor.renderer();
    let host = renderer.host();

    let element = host.create_element(node.tag())?;
    for (key, value) in node.props() {
        apply_prop(host, element, key, value)?;
    }

    // Children are built into the detached element before it is attached.
    for child in node.rendered_children() {
        let child_anchor = Anchor::at_end(renderer, element)?;
        materialize_rendered(&child, &child_anchor)?;
    }

    anchor.clear_and_insert(element)
}

fn materialize_text(node: &TextNode, anchor: &Anchor) -> RenderResult<()> {
    node.set_anchor(anchor.clone());
    let text = anchor.renderer().host().create_text(node.content())?;
    anchor.clear_and_insert(text)
}

fn apply_prop(
    host: &dyn HostDocument,
    element: HostNode,
    key: &str,
    value: &PropValue,
) -> RenderResult<()> {
    if let Some(handler) = value.as_handler() {
        match event_name(key) {
            Some(event) => host.add_listener(element, &event, handler.clone())?,
            None => warn!(prop = key, "event handler under a non-event prop, skipped"),
        }
        return Ok(());
    }

    let attribute = if key == CLASS_NAME_PROP { CLASS_ATTRIBUTE } else { key };
    host.set_attribute(element, attribute, &value.to_string())?;
    Ok(())
}

/// Whether `new` may reuse the host subtree of `old`.
///
/// Only the node itself is compared; children are the differ's business.
pub(crate) fn same_node(old: &RenderedNode, new: &RenderedNode, policy: PropCountPolicy) -> bool {
    match (old, new) {
        (RenderedNode::Element(old), RenderedNode::Element(new)) => {
            old.tag() == new.tag() && props_match(old.props(), new.props(), policy)
        }
        (RenderedNode::Text(old), RenderedNode::Text(new)) => old.content() == new.content(),
        _ => false,
    }
}

fn props_match(old: &Props, new: &Props, policy: PropCountPolicy) -> bool {
    new.iter().all(|(key, value)| old.get(key) == Some(value))
        && policy.accepts(old.len(), new.len())
}

/// Patch the host so that `new` replaces the materialized `old`.
pub(crate) fn diff(old: &RenderedNode, new: &RenderedNode) -> RenderResult<()> {
    let anchor = old.anchor().ok_or(RenderError::NotMaterialized)?;
    let policy = anchor.renderer().config().prop_count;

    if !same_node(old, new, policy) {
        debug!(old = old.node_type(), new = new.node_type(), "remounting changed node");
        return materialize_rendered(new, &anchor);
    }

    new.set_anchor(anchor.clone());
    match (old, new) {
        (RenderedNode::Element(old), RenderedNode::Element(new)) => {
            diff_children(old, new, &anchor)
        }
        _ => Ok(()),
    }
}

fn diff_children(old: &ElementNode, new: &ElementNode, anchor: &Anchor) -> RenderResult<()> {
    let new_children = new.rendered_children();
    // Old children beyond the new count are left in place.
    if new_children.is_empty() {
        return Ok(());
    }
    let old_children = old.rendered_children();

    let mut tail = match old_children.last() {
        Some(last) => last.anchor().ok_or(RenderError::NotMaterialized)?,
        None => {
            let element = anchor.single_node().ok_or(RenderError::NotSingleNode)?;
            Anchor::at_end(anchor.renderer(), element)?
        }
    };

    for (index, child) in new_children.iter().enumerate() {
        match old_children.get(index) {
            Some(old_child) => diff(old_child, child)?,
            None => {
                let child_anchor = tail.after();
                debug!(index, node = child.node_type(), "appending child");
                materialize_rendered(child, &child_anchor)?;
                tail = child_anchor;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use test_case::test_case;

    use crate::host::EventHandler;
    use crate::memory::{MemoryDocument, Mutation};
    use crate::mount::Renderer;
    use crate::node::{element, text};
    use crate::RenderConfig;

    struct Fixture {
        doc: Rc<MemoryDocument>,
        renderer: Renderer,
        container: HostNode,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_config(RenderConfig::default())
        }

        fn with_config(config: RenderConfig) -> Self {
            let doc = Rc::new(MemoryDocument::new());
            let container = doc.create_container("body").unwrap();
            let renderer = Renderer::new(doc.clone(), config);
            Self {
                doc,
                renderer,
                container,
            }
        }

        fn materialize(&self, node: &VNode) -> RenderedNode {
            let anchor = Anchor::at_end(&self.renderer, self.container).unwrap();
            let tree = node.virtual_tree();
            materialize_rendered(&tree, &anchor).unwrap();
            self.doc.take_mutations();
            tree
        }

        fn html(&self) -> String {
            self.doc.inner_html(self.container).unwrap()
        }
    }

    fn div(props: Props, children: Vec<VNode>) -> VNode {
        element("div", props, children)
    }

    #[test]
    fn element_props_become_attributes_and_listeners() {
        let fx = Fixture::new();
        let handler = EventHandler::new(|_| Ok(()));
        let node = element(
            "button",
            Props::new()
                .with("id", "go")
                .with("className", "primary")
                .with("onclick", handler),
            "Go",
        );

        let tree = fx.materialize(&node);
        let button = tree.host_node().unwrap();

        assert_eq!(
            fx.html(),
            "<button class=\"primary\" id=\"go\">Go</button>"
        );
        assert_eq!(fx.doc.attribute(button, "onclick").unwrap(), None);
        assert_eq!(fx.doc.listener_count(button, "click").unwrap(), 1);
    }

    #[test]
    fn non_handler_event_prop_is_an_attribute() {
        let fx = Fixture::new();
        fx.materialize(&element("a", Props::new().with("online", "yes"), ()));
        assert_eq!(fx.html(), "<a online=\"yes\"></a>");
    }

    #[test]
    fn handler_under_plain_key_is_skipped() {
        let fx = Fixture::new();
        let handler = EventHandler::new(|_| Ok(()));
        fx.materialize(&element("a", Props::new().with("href", handler), ()));
        assert_eq!(fx.html(), "<a></a>");
    }

    #[test]
    fn children_are_built_before_attach() {
        let fx = Fixture::new();
        let node = div(Props::new(), vec![element("span", Props::new(), "x")]);
        let anchor = Anchor::at_end(&fx.renderer, fx.container).unwrap();
        materialize_rendered(&node.virtual_tree(), &anchor).unwrap();

        let journal = fx.doc.take_mutations();
        let attach = journal
            .iter()
            .position(|m| matches!(m, Mutation::Insert { parent, .. } if *parent == fx.container))
            .unwrap();
        assert_eq!(attach, journal.len() - 1);
    }

    #[test]
    fn materialize_records_anchors_on_every_node() {
        let fx = Fixture::new();
        let tree = fx.materialize(&div(Props::new(), vec![text("a"), text("b")]));

        let children = tree.as_element().unwrap().rendered_children();
        let hosts: Vec<HostNode> = children.iter().map(|c| c.host_node().unwrap()).collect();
        let parent = tree.host_node().unwrap();
        assert_eq!(fx.doc.child_nodes(parent).unwrap(), hosts);
    }

    #[test]
    fn invalid_tag_propagates_host_error() {
        let fx = Fixture::new();
        let anchor = Anchor::at_end(&fx.renderer, fx.container).unwrap();
        let err = materialize(&element("not a tag", Props::new(), ()), &anchor).unwrap_err();
        assert!(err.is_host_error());
    }

    #[test]
    fn identical_tree_diff_is_silent() {
        let fx = Fixture::new();
        let build = || {
            div(
                Props::new().with("id", "root"),
                vec![
                    element("h2", Props::new(), "title"),
                    div(Props::new().with("className", "body"), vec![text("a"), text("b")]),
                ],
            )
        };
        let old = fx.materialize(&build());
        let new = build().virtual_tree();

        diff(&old, &new).unwrap();

        assert!(fx.doc.mutations().is_empty());
        assert_eq!(new.host_node(), old.host_node());
        assert!(new.anchor().unwrap().ptr_eq(&old.anchor().unwrap()));
    }

    #[test_case(element("span", Props::new(), "a") ; "tag changed")]
    #[test_case(div(Props::new().with("id", "b"), vec![text("a")]) ; "prop value changed")]
    #[test_case(div(Props::new().with("id", "a").with("title", "t"), vec![text("a")]) ; "prop added")]
    #[test_case(div(Props::new(), vec![text("a")]) ; "prop removed")]
    #[test_case(text("a") ; "element became text")]
    fn changed_root_is_remounted(new: VNode) {
        let fx = Fixture::new();
        let old = fx.materialize(&div(Props::new().with("id", "a"), vec![text("a")]));
        let old_host = old.host_node().unwrap();
        let new = new.virtual_tree();

        diff(&old, &new).unwrap();

        let new_host = new.host_node().unwrap();
        assert_ne!(new_host, old_host);
        assert_eq!(fx.doc.child_nodes(fx.container).unwrap(), vec![new_host]);
        assert_eq!(fx.doc.parent_of(old_host).unwrap(), None);
    }

    #[test]
    fn remount_does_not_compare_children() {
        let fx = Fixture::new();
        let old = fx.materialize(&div(Props::new().with("id", "a"), vec![text("same")]));
        let old_text = old.as_element().unwrap().rendered_children()[0]
            .host_node()
            .unwrap();

        let new = div(Props::new().with("id", "b"), vec![text("same")]).virtual_tree();
        diff(&old, &new).unwrap();

        let new_text = new.as_element().unwrap().rendered_children()[0]
            .host_node()
            .unwrap();
        assert_ne!(old_text, new_text);
    }

    #[test]
    fn text_change_replaces_only_the_text() {
        let fx = Fixture::new();
        let old = fx.materialize(&div(Props::new(), vec![text("a"), text("b")]));
        let new = div(Props::new(), vec![text("a"), text("B")]).virtual_tree();

        diff(&old, &new).unwrap();

        assert_eq!(fx.html(), "<div>aB</div>");
        let created: Vec<Mutation> = fx
            .doc
            .mutations()
            .into_iter()
            .filter(|m| !m.is_structural())
            .collect();
        assert_eq!(created.len(), 1);
        assert!(matches!(&created[0], Mutation::CreateText { content, .. } if content == "B"));
    }

    #[test]
    fn growth_appends_after_the_last_old_child() {
        let fx = Fixture::new();
        let old = fx.materialize(&div(Props::new(), vec![text("a")]));
        let a_host = old.as_element().unwrap().rendered_children()[0]
            .host_node()
            .unwrap();

        let new = div(Props::new(), vec![text("a"), text("b"), text("c")]).virtual_tree();
        diff(&old, &new).unwrap();

        assert_eq!(fx.html(), "<div>abc</div>");
        let new_children = new.as_element().unwrap().rendered_children();
        assert_eq!(new_children[0].host_node(), Some(a_host));
        let parent = new.host_node().unwrap();
        let hosts: Vec<HostNode> = new_children.iter().map(|c| c.host_node().unwrap()).collect();
        assert_eq!(fx.doc.child_nodes(parent).unwrap(), hosts);
    }

    #[test]
    fn growth_after_a_replaced_last_child_lands_after_the_replacement() {
        let fx = Fixture::new();
        let old = fx.materialize(&div(Props::new(), vec![text("a"), text("b")]));
        let new = div(Props::new(), vec![text("a"), text("B"), text("c")]).virtual_tree();

        diff(&old, &new).unwrap();

        assert_eq!(fx.html(), "<div>aBc</div>");
    }

    #[test]
    fn growth_from_no_children_appends_into_the_element() {
        let fx = Fixture::new();
        let old = fx.materialize(&div(Props::new(), vec![]));
        let new = div(Props::new(), vec![text("x"), text("y")]).virtual_tree();

        diff(&old, &new).unwrap();

        assert_eq!(fx.html(), "<div>xy</div>");
        assert_eq!(new.host_node(), old.host_node());
    }

    #[test]
    fn shrink_leaves_extra_children() {
        let fx = Fixture::new();
        let old = fx.materialize(&div(Props::new(), vec![text("a"), text("b"), text("c")]));
        let new = div(Props::new(), vec![text("a")]).virtual_tree();

        diff(&old, &new).unwrap();

        assert_eq!(fx.html(), "<div>abc</div>");
        assert!(fx.doc.mutations().is_empty());
    }

    #[test]
    fn empty_new_children_stop_the_diff() {
        let fx = Fixture::new();
        let old = fx.materialize(&div(Props::new(), vec![text("a")]));
        let new = div(Props::new(), vec![]).virtual_tree();

        diff(&old, &new).unwrap();

        assert_eq!(fx.html(), "<div>a</div>");
        assert!(fx.doc.mutations().is_empty());
    }

    #[test]
    fn nested_changes_patch_in_place() {
        let fx = Fixture::new();
        let old = fx.materialize(&div(
            Props::new(),
            vec![element("ul", Props::new(), vec![element("li", Props::new(), "1")])],
        ));
        let new = div(
            Props::new(),
            vec![element(
                "ul",
                Props::new(),
                vec![
                    element("li", Props::new(), "1"),
                    element("li", Props::new(), "2"),
                ],
            )],
        )
        .virtual_tree();

        diff(&old, &new).unwrap();

        assert_eq!(fx.html(), "<div><ul><li>1</li><li>2</li></ul></div>");
        assert_eq!(new.host_node(), old.host_node());
    }

    #[test]
    fn diffing_an_unmaterialized_node_fails() {
        let old = text("a").virtual_tree();
        let new = text("b").virtual_tree();
        assert!(matches!(diff(&old, &new), Err(RenderError::NotMaterialized)));
    }

    #[test]
    fn handlers_compare_by_identity() {
        let shared = EventHandler::new(|_| Ok(()));
        let with = |handler: EventHandler| {
            element("button", Props::new().with("onclick", handler), ()).virtual_tree()
        };

        let policy = PropCountPolicy::Exact;
        assert!(same_node(&with(shared.clone()), &with(shared.clone()), policy));
        assert!(!same_node(
            &with(shared),
            &with(EventHandler::new(|_| Ok(()))),
            policy
        ));
    }

    #[test_case(PropCountPolicy::Exact => false)]
    #[test_case(PropCountPolicy::NotShrunk => true)]
    fn prop_growth_under_policy(policy: PropCountPolicy) -> bool {
        let old = div(Props::new().with("id", "a"), vec![]).virtual_tree();
        let new = div(Props::new().with("id", "a").with("title", "t"), vec![]).virtual_tree();
        same_node(&old, &new, policy)
    }

    #[test]
    fn prop_shrink_is_never_same() {
        let old = div(Props::new().with("id", "a").with("title", "t"), vec![]).virtual_tree();
        let new = div(Props::new().with("id", "a"), vec![]).virtual_tree();
        assert!(!same_node(&old, &new, PropCountPolicy::Exact));
        assert!(!same_node(&old, &new, PropCountPolicy::NotShrunk));
    }

    #[test]
    fn legacy_policy_reuses_nodes_that_gained_props() {
        let fx = Fixture::with_config(
            RenderConfig::default().with_prop_count(PropCountPolicy::NotShrunk),
        );
        let old = fx.materialize(&div(Props::new().with("id", "a"), vec![text("x")]));
        let new = div(Props::new().with("id", "a").with("title", "t"), vec![text("x")])
            .virtual_tree();

        diff(&old, &new).unwrap();

        // Reused as-is: the new prop never reaches the host.
        assert_eq!(new.host_node(), old.host_node());
        assert_eq!(fx.html(), "<div id=\"a\">x</div>");
    }

    #[test]
    fn text_content_decides_sameness() {
        let policy = PropCountPolicy::Exact;
        assert!(same_node(
            &text("a").virtual_tree(),
            &text("a").virtual_tree(),
            policy
        ));
        assert!(!same_node(
            &text("a").virtual_tree(),
            &text("b").virtual_tree(),
            policy
        ));
    }
}
