//! Core types for color reduction.

pub mod graph;

pub use graph::{Adjacency, Color, Graph, GraphBuilder, GraphError, Node, NodeId};
