//! Proptest strategies for reconciliation property tests
//!
//! Trees are generated as plain [`TreeShape`] values so a test can build any
//! number of identical, independent virtual trees from one sample.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::node::{element, text, Props, VNode};

#[derive(Debug, Clone, PartialEq)]
pub enum TreeShape {
    Text(String),
    Element {
        tag: String,
        props: BTreeMap<String, String>,
        children: Vec<TreeShape>,
    },
}

impl TreeShape {
    pub fn element(tag: &str, children: Vec<TreeShape>) -> Self {
        Self::Element {
            tag: tag.to_string(),
            props: BTreeMap::new(),
            children,
        }
    }

    /// A fresh virtual tree of this shape.
    pub fn build(&self) -> VNode {
        match self {
            Self::Text(content) => text(content.clone()),
            Self::Element {
                tag,
                props,
                children,
            } => {
                let props = props
                    .iter()
                    .fold(Props::new(), |acc, (k, v)| acc.with(k.clone(), v.clone()));
                element(
                    tag,
                    props,
                    children.iter().map(TreeShape::build).collect::<Vec<_>>(),
                )
            }
        }
    }

    /// The HTML a `MemoryDocument` produces for this tree.
    pub fn to_html(&self) -> String {
        match self {
            Self::Text(content) => content.clone(),
            Self::Element {
                tag,
                props,
                children,
            } => {
                let attributes: BTreeMap<&str, &str> = props
                    .iter()
                    .map(|(k, v)| {
                        let name = if k == "className" { "class" } else { k.as_str() };
                        (name, v.as_str())
                    })
                    .collect();
                let mut out = format!("<{}", tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, value));
                }
                out.push('>');
                for child in children {
                    out.push_str(&child.to_html());
                }
                out.push_str(&format!("</{}>", tag));
                out
            }
        }
    }
}

pub fn arb_tag() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("div".to_string()),
        Just("span".to_string()),
        Just("p".to_string()),
        Just("ul".to_string()),
        Just("li".to_string()),
        Just("section".to_string()),
    ]
}

/// Plain-text content; no characters the serializer would escape
pub fn arb_text() -> impl Strategy<Value = String> {
    "[a-z ]{0,8}"
}

pub fn arb_props() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(
        prop_oneof![
            Just("id".to_string()),
            Just("title".to_string()),
            Just("className".to_string()),
            Just("data-role".to_string()),
        ],
        "[a-z0-9]{0,5}",
        0..3,
    )
}

pub fn arb_tree() -> impl Strategy<Value = TreeShape> {
    let leaf = arb_text().prop_map(TreeShape::Text);
    leaf.prop_recursive(4, 32, 4, |inner| {
        (arb_tag(), arb_props(), prop::collection::vec(inner, 0..4)).prop_map(
            |(tag, props, children)| TreeShape::Element {
                tag,
                props,
                children,
            },
        )
    })
}

/// Child lists for growth and shrink tests
pub fn arb_children(min: usize) -> impl Strategy<Value = Vec<TreeShape>> {
    prop::collection::vec(arb_tree(), min..min + 4)
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::String),
    ]
}

/// Arbitrary nested state values
pub fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-d]", inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Object-shaped state, the usual shape of component state
pub fn arb_state() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-d]", arb_value(), 0..5)
        .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>()))
}
