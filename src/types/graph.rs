//! Graph model: an arena of colored nodes with symmetric adjacency.
//!
//! Nodes live in a `Vec` owned by the [`Graph`] and refer to each other by
//! [`NodeId`] (arena index). Cloning a graph therefore produces a fully
//! independent copy whose adjacency can only point into the copy itself.
//!
//! ## Invariants
//!
//! - **Symmetry**: `b ∈ neighbors(a)` iff `a ∈ neighbors(b)`
//! - **Degree bound**: `max_degree` is at least the true maximum degree
//!
//! Both are checked by [`GraphBuilder::build`]; a `Graph` value cannot be
//! obtained without them holding. Colors are free to change afterwards, and
//! [`Graph::is_safe`] reports whether the current coloring is proper.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::canonical::canonical_hash_hex;

/// A node color. Any non-negative integer is a valid color.
pub type Color = usize;

/// Adjacency lists indexed by [`NodeId::index`].
pub type Adjacency = Vec<Vec<NodeId>>;

/// Index of a node inside its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Create a node id from an arena index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena index of this node.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural errors in a graph description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two nodes share a name.
    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),
    /// A neighbor reference names no node of the graph.
    #[error("Unknown node: {0}")]
    UnknownNode(String),
    /// A node id outside the arena.
    #[error("Node id out of range: {0}")]
    NodeOutOfRange(NodeId),
    /// A node lists itself as a neighbor.
    #[error("Self loop on node: {0}")]
    SelfLoop(String),
    /// `from` lists `to` as a neighbor but not the other way round.
    #[error("Asymmetric edge: {from} lists {to} but {to} does not list {from}")]
    AsymmetricEdge {
        /// Node that lists the neighbor.
        from: String,
        /// Node missing the back reference.
        to: String,
    },
    /// A node has more neighbors than the declared bound.
    #[error("Node {node} has degree {degree}, above declared max degree {max_degree}")]
    MaxDegreeExceeded {
        /// Offending node.
        node: String,
        /// Its actual degree.
        degree: usize,
        /// Declared bound.
        max_degree: usize,
    },
}

/// A named, colored vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    name: String,
    color: Color,
    neighbors: Vec<NodeId>,
}

impl Node {
    /// Node name, unique within its graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Neighbors in insertion order.
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    /// Number of neighbors.
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }
}

/// Undirected graph with a declared maximum degree and a node coloring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Graph {
    name: String,
    description: String,
    max_degree: usize,
    nodes: Vec<Node>,
}

impl Graph {
    /// Graph name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Declared maximum degree (Δ).
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Δ+1, the color count every reduction aims for.
    ///
    /// The declared Δ is only an upper bound, so it is clamped to the node
    /// count first: no graph ever needs more colors than it has nodes.
    pub fn color_bound(&self) -> usize {
        self.max_degree.min(self.len()).saturating_add(1)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in parse order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All node ids in arena order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Find a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Neighbors of `id`; empty for ids outside the arena.
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.neighbors.as_slice()).unwrap_or(&[])
    }

    /// Color of `id`.
    pub fn color(&self, id: NodeId) -> Option<Color> {
        self.nodes.get(id.0).map(|n| n.color)
    }

    /// Recolor a single node.
    pub fn set_color(&mut self, id: NodeId, color: Color) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(id.0).ok_or(GraphError::NodeOutOfRange(id))?;
        node.color = color;
        Ok(())
    }

    /// Overwrite colors in arena order; surplus entries are ignored.
    pub(crate) fn apply_colors(&mut self, colors: &[Color]) {
        for (node, &color) in self.nodes.iter_mut().zip(colors) {
            node.color = color;
        }
    }

    /// Current colors in arena order.
    pub fn colors(&self) -> Vec<Color> {
        self.nodes.iter().map(|n| n.color).collect()
    }

    /// Owned copy of the adjacency lists.
    pub fn adjacency(&self) -> Adjacency {
        self.nodes.iter().map(|n| n.neighbors.clone()).collect()
    }

    /// Undirected edges, each reported once as `(lower, higher)`.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            for &n in &node.neighbors {
                if i < n.0 {
                    edges.push((NodeId(i), n));
                }
            }
        }
        edges
    }

    /// Largest neighbor count of any node.
    pub fn true_max_degree(&self) -> usize {
        self.nodes.iter().map(Node::degree).max().unwrap_or(0)
    }

    /// True iff every edge joins differently colored nodes.
    pub fn is_safe(&self) -> bool {
        self.nodes.iter().all(|node| {
            node.neighbors
                .iter()
                .all(|n| self.nodes[n.0].color != node.color)
        })
    }

    /// Edges whose endpoints share a color.
    pub fn conflicts(&self) -> Vec<(NodeId, NodeId)> {
        self.edges()
            .into_iter()
            .filter(|(a, b)| self.nodes[a.0].color == self.nodes[b.0].color)
            .collect()
    }

    /// Number of distinct colors in use.
    pub fn count_colors(&self) -> usize {
        self.nodes.iter().map(|n| n.color).collect::<HashSet<_>>().len()
    }

    /// Independent clone. Adjacency is index based, so the copy can only
    /// reference its own nodes.
    pub fn deep_copy(&self) -> Graph {
        self.clone()
    }

    /// Give every node a distinct color `0..n`, the trivial proper coloring.
    pub fn run_color_init(&mut self) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.color = i;
        }
    }

    /// Hex fingerprint of the `(name, color)` sequence.
    pub fn coloring_fingerprint(&self) -> String {
        let pairs: Vec<(&str, Color)> = self
            .nodes
            .iter()
            .map(|n| (n.name.as_str(), n.color))
            .collect();
        canonical_hash_hex(&pairs)
    }

    /// Re-check symmetry and the degree bound.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (i, node) in self.nodes.iter().enumerate() {
            for &n in &node.neighbors {
                let other = self.nodes.get(n.0).ok_or(GraphError::NodeOutOfRange(n))?;
                if n.0 == i {
                    return Err(GraphError::SelfLoop(node.name.clone()));
                }
                if !other.neighbors.contains(&NodeId(i)) {
                    return Err(GraphError::AsymmetricEdge {
                        from: node.name.clone(),
                        to: other.name.clone(),
                    });
                }
            }
        }
        for node in &self.nodes {
            if node.degree() > self.max_degree {
                return Err(GraphError::MaxDegreeExceeded {
                    node: node.name.clone(),
                    degree: node.degree(),
                    max_degree: self.max_degree,
                });
            }
        }
        Ok(())
    }
}

/// Incremental graph construction with validation on [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    name: String,
    description: String,
    max_degree: Option<usize>,
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

impl GraphBuilder {
    /// Start a graph with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare Δ. Without a declaration the true maximum degree is used.
    pub fn with_max_degree(mut self, max_degree: usize) -> Self {
        self.max_degree = Some(max_degree);
        self
    }

    /// Add a node; names must be unique.
    pub fn add_node(&mut self, name: impl Into<String>, color: Color) -> Result<NodeId, GraphError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(GraphError::DuplicateNode(name));
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(name.clone(), id);
        self.nodes.push(Node {
            name,
            color,
            neighbors: Vec::new(),
        });
        Ok(id)
    }

    /// Id of a previously added node.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Record `to` as a neighbor of `from` only. Repeated arcs are ignored.
    ///
    /// Input files list neighbors per node, so each undirected edge arrives
    /// as two arcs; a missing half is reported by [`build`](Self::build).
    pub fn add_arc(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        if to.0 >= self.nodes.len() {
            return Err(GraphError::NodeOutOfRange(to));
        }
        let node = self
            .nodes
            .get_mut(from.0)
            .ok_or(GraphError::NodeOutOfRange(from))?;
        if from == to {
            return Err(GraphError::SelfLoop(node.name.clone()));
        }
        if !node.neighbors.contains(&to) {
            node.neighbors.push(to);
        }
        Ok(())
    }

    /// Record an undirected edge.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<(), GraphError> {
        self.add_arc(a, b)?;
        self.add_arc(b, a)
    }

    /// Validate and produce the graph.
    pub fn build(self) -> Result<Graph, GraphError> {
        let true_max = self.nodes.iter().map(Node::degree).max().unwrap_or(0);
        let graph = Graph {
            name: self.name,
            description: self.description,
            max_degree: self.max_degree.unwrap_or(true_max),
            nodes: self.nodes,
        };
        graph.validate()?;
        Ok(graph)
    }
}
