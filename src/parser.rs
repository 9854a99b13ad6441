//! Graph description files.
//!
//! A graph file is a JSON document listing every node with its neighbors:
//!
//! ```json
//! {
//!   "name": "triangle",
//!   "description": "three mutually adjacent nodes",
//!   "max_degree": 2,
//!   "initial_coloring": false,
//!   "nodes": [
//!     { "name": "a", "color": 0, "neighbors": ["b", "c"] },
//!     { "name": "b", "color": 1, "neighbors": ["a", "c"] },
//!     { "name": "c", "color": 2, "neighbors": ["a", "b"] }
//!   ]
//! }
//! ```
//!
//! Neighbor lists are read as directed half-edges; each undirected edge
//! must appear in both lists or the file is rejected.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::types::{Color, Graph, GraphBuilder, GraphError};

/// Error type for graph file parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The file could not be read.
    #[error("Failed to read graph file: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid graph JSON.
    #[error("Malformed graph document: {0}")]
    Json(#[from] serde_json::Error),
    /// The graph violates a structural invariant.
    #[error("Invalid graph structure: {0}")]
    Structure(#[from] GraphError),
}

/// On-disk form of a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFile {
    /// Graph name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Declared maximum degree.
    pub max_degree: usize,
    /// Replace colors with the trivial coloring after loading.
    #[serde(default)]
    pub initial_coloring: bool,
    /// Nodes in order.
    pub nodes: Vec<NodeEntry>,
}

/// One node of a [`GraphFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Unique node name.
    pub name: String,
    /// Starting color.
    #[serde(default)]
    pub color: Color,
    /// Names of adjacent nodes.
    #[serde(default)]
    pub neighbors: Vec<String>,
}

impl GraphFile {
    /// Build and validate the graph.
    pub fn into_graph(self) -> Result<Graph, GraphError> {
        let mut builder = GraphBuilder::new(self.name)
            .with_description(self.description)
            .with_max_degree(self.max_degree);

        for node in &self.nodes {
            builder.add_node(node.name.clone(), node.color)?;
        }
        for node in &self.nodes {
            let from = builder
                .node_id(&node.name)
                .ok_or_else(|| GraphError::UnknownNode(node.name.clone()))?;
            for neighbor in &node.neighbors {
                let to = builder
                    .node_id(neighbor)
                    .ok_or_else(|| GraphError::UnknownNode(neighbor.clone()))?;
                builder.add_arc(from, to)?;
            }
        }

        let mut graph = builder.build()?;
        if self.initial_coloring {
            graph.run_color_init();
        }
        Ok(graph)
    }

    /// Describe an existing graph in file form.
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            name: graph.name().to_string(),
            description: graph.description().to_string(),
            max_degree: graph.max_degree(),
            initial_coloring: false,
            nodes: graph
                .nodes()
                .iter()
                .map(|node| NodeEntry {
                    name: node.name().to_string(),
                    color: node.color(),
                    neighbors: node
                        .neighbors()
                        .iter()
                        .filter_map(|&n| graph.node(n).map(|m| m.name().to_string()))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Parse a graph document from a string.
///
/// With `init_colors` set, the trivial coloring is applied regardless of the
/// document's own `initial_coloring` flag.
pub fn parse_str(text: &str, init_colors: bool) -> Result<Graph, ParseError> {
    let file: GraphFile = serde_json::from_str(text)?;
    let mut graph = file.into_graph()?;
    if init_colors {
        graph.run_color_init();
    }
    debug!(
        graph = %graph.name(),
        nodes = graph.len(),
        max_degree = graph.max_degree(),
        "parsed graph"
    );
    Ok(graph)
}

/// Read and parse a graph file.
pub fn parse_file(path: impl AsRef<Path>, init_colors: bool) -> Result<Graph, ParseError> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text, init_colors)
}
