//! Subscription graph export for debugging.
//!
//! Pure functions over a [`RegistrySnapshot`]; nothing here touches a
//! live registry.

use crate::registry::{EntrySnapshot, RegistrySnapshot};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_GRAPH_NAME: &str = "SubscriptionGraph";

const DEFAULT_FILL: &str = "#D2E5FF";
const DEFAULT_BORDER: &str = "grey";

/// One registry key rendered as a graph node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// First registered parent, used to cluster nodes.
    pub group: Option<String>,
    pub fill_color: Option<String>,
    pub border_color: Option<String>,
}

impl GraphNode {
    /// A bare node labelled with its key.
    pub fn plain(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            group: None,
            fill_color: None,
            border_color: None,
        }
    }

    fn to_dot(&self) -> String {
        let fill = self
            .fill_color
            .as_ref()
            .map(|color| format!(" style=filled fillcolor={}", quoted(color)))
            .unwrap_or_default();
        let border = self
            .border_color
            .as_ref()
            .map(|color| format!(" color={}", quoted(color)))
            .unwrap_or_default();
        format!(
            "{} [label={}{fill}{border}]",
            quoted(&self.id),
            quoted(&self.label)
        )
    }
}

/// Parent to child edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SubscriptionGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Default node: locator, key, subscriber count and nested counts.
pub fn default_node(key: &str, entry: &EntrySnapshot) -> GraphNode {
    let locator = match &entry.locator {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let mut label = format!("{locator} \n {key} \n # subscribers: {}", entry.ref_count);
    if !entry.child_keys.is_empty() {
        label.push_str(&format!("\n # children subs: {}", entry.child_keys.len()));
    }
    if !entry.field_keys.is_empty() {
        label.push_str(&format!("\n # field subs: {}", entry.field_keys.len()));
    }

    GraphNode {
        id: key.to_string(),
        label,
        group: None,
        fill_color: Some(DEFAULT_FILL.to_string()),
        border_color: Some(DEFAULT_BORDER.to_string()),
    }
}

pub fn as_nodes_and_edges(snapshot: &RegistrySnapshot) -> SubscriptionGraph {
    as_nodes_and_edges_with(snapshot, default_node)
}

/// Build the graph with a custom node builder.
///
/// Edges are only drawn from parents that are registered themselves, so
/// `_root` never shows up.
pub fn as_nodes_and_edges_with<F>(snapshot: &RegistrySnapshot, make_node: F) -> SubscriptionGraph
where
    F: Fn(&str, &EntrySnapshot) -> GraphNode,
{
    let mut graph = SubscriptionGraph::default();
    for (key, entry) in &snapshot.entries {
        let mut node = make_node(key, entry);
        node.id = key.clone();
        for parent in entry.parent_edges.keys() {
            if !snapshot.contains(parent) {
                continue;
            }
            graph.edges.push(GraphEdge {
                from: parent.clone(),
                to: key.clone(),
            });
            if node.group.is_none() {
                node.group = Some(parent.clone());
            }
        }
        graph.nodes.push(node);
    }
    graph
}

/// Render the snapshot as Graphviz dot text.
pub fn as_dot_graph(snapshot: &RegistrySnapshot, name: Option<&str>) -> String {
    dot_graph(&as_nodes_and_edges(snapshot), name)
}

pub fn dot_graph(graph: &SubscriptionGraph, name: Option<&str>) -> String {
    let name = name.unwrap_or(DEFAULT_GRAPH_NAME);
    let nodes: Vec<String> = graph.nodes.iter().map(GraphNode::to_dot).collect();
    let edges: Vec<String> = graph
        .edges
        .iter()
        .map(|edge| format!("{} -> {}", quoted(&edge.from), quoted(&edge.to)))
        .collect();
    format!(
        "digraph {} {{ {} ;\n{} ;\n }}",
        quoted(name),
        nodes.join(" ;\n"),
        edges.join(" ;\n")
    )
}

/// Dot string literal; `"` and `\` are escaped.
fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
