//! Visualization module for the thought index
//!
//! This module turns the links stored in a [`ThoughtIndex`] into a network
//! graph that can be rendered with Graphviz (dot) or a web front end (JSON).

use crate::index::{ThoughtFilter, ThoughtIndex};
use crate::name::Name;
use crate::Result;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// GraphData structure representing the graph for visualization
#[derive(Debug, Clone, Serialize)]
pub struct GraphData {
    /// Nodes in the graph, representing thoughts
    pub nodes: Vec<Node>,
    /// Edges in the graph, representing links between thoughts
    pub edges: Vec<Edge>,
}

/// A node in the graph visualization, representing a single thought
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// The thought's name
    pub id: String,
    /// Display label for the node (the thought's title, or its name)
    pub label: String,
    /// Tags associated with this node
    pub tags: Vec<String>,
    /// True for link targets that have no thought in the index
    pub missing: bool,
}

/// An edge in the graph visualization, representing a link between thoughts
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    /// Unique identifier for the edge
    pub id: String,
    /// Source node ID (the thought containing the link)
    pub source: String,
    /// Target node ID (the linked name)
    pub target: String,
}

impl GraphData {
    /// Generate DOT format representation of the graph suitable for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph Thoughts {\n");
        dot.push_str("  node [shape=box, style=filled, fillcolor=lightblue];\n\n");

        for node in &self.nodes {
            let label = escape(&node.label);
            if node.missing {
                dot.push_str(&format!(
                    "  \"{}\" [label=\"{}\", style=dashed, fillcolor=white];\n",
                    escape(&node.id),
                    label
                ));
            } else {
                dot.push_str(&format!("  \"{}\" [label=\"{}\"];\n", escape(&node.id), label));
            }
        }

        dot.push('\n');

        for edge in &self.edges {
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                escape(&edge.source),
                escape(&edge.target)
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Generate JSON representation of the graph suitable for D3.js or other web visualizations
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Adds placeholder nodes for link targets that are not in the graph.
    fn add_missing_targets(&mut self) {
        let known: HashSet<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let missing: BTreeSet<Name> = self
            .edges
            .iter()
            .filter(|e| !known.contains(&e.target))
            .map(|e| Name::parse(&e.target))
            .collect();

        self.nodes.extend(missing.into_iter().map(|name| Node {
            id: name.to_string(),
            label: name.to_string(),
            tags: Vec::new(),
            missing: true,
        }));
    }
}

fn escape(id: &str) -> String {
    id.replace('"', "\\\"")
}

fn node_for(name: &Name, title: &str, tags: Vec<String>) -> Node {
    Node {
        id: name.to_string(),
        label: if title.is_empty() {
            name.to_string()
        } else {
            title.to_string()
        },
        tags,
        missing: false,
    }
}

/// Function to generate visualization data from a ThoughtIndex
pub fn generate_graph_data(index: &ThoughtIndex) -> Result<GraphData> {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut edge_id = 0;

    for thought in index.list_thoughts(&ThoughtFilter::new())? {
        let tags = thought.tags.iter().map(|t| t.title.clone()).collect();
        nodes.push(node_for(&thought.name, &thought.title, tags));

        for link in &thought.links {
            edge_id += 1;
            edges.push(Edge {
                id: format!("edge_{}", edge_id),
                source: thought.name.to_string(),
                target: link.target.clone(),
            });
        }
    }

    let mut graph = GraphData { nodes, edges };
    graph.add_missing_targets();
    Ok(graph)
}

/// Function to generate a subgraph centered around a specific thought
///
/// Follows links in both directions up to `depth` steps from `center`,
/// breadth first, so every thought is reached along its shortest path.
/// Links to stored thoughts outside that radius are left out; links to
/// names with no stored thought keep their placeholder node.
pub fn generate_focused_graph(index: &ThoughtIndex, center: &Name, depth: usize) -> Result<GraphData> {
    let mut visited = HashSet::new();
    let mut nodes = Vec::new();
    let mut links = Vec::new();

    let mut queue = VecDeque::from([(center.clone(), 0)]);
    visited.insert(center.clone());

    while let Some((current, current_depth)) = queue.pop_front() {
        let Some(thought) = index.get(&current)? else {
            continue;
        };

        let tags = thought.tags.iter().map(|t| t.title.clone()).collect();
        nodes.push(node_for(&current, &thought.title, tags));

        // Outgoing links
        for link in &thought.links {
            let target = link.target_name();
            if current_depth < depth && visited.insert(target.clone()) {
                queue.push_back((target, current_depth + 1));
            }
            links.push((current.to_string(), link.target.clone()));
        }

        // Incoming links
        for backlink in index.backlinks(&current)? {
            if current_depth < depth && visited.insert(backlink.clone()) {
                queue.push_back((backlink, current_depth + 1));
            }
        }
    }

    let reached: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let mut edges = Vec::new();
    for (source, target) in links {
        let keep = reached.contains(&target) || index.get(&Name::parse(&target))?.is_none();
        if keep {
            edges.push(Edge {
                id: format!("edge_{}", edges.len() + 1),
                source,
                target,
            });
        }
    }

    let mut graph = GraphData { nodes, edges };
    graph.add_missing_targets();
    Ok(graph)
}
