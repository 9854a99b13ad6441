//! Renderer hand-off for before/after graph pairs.
//!
//! The harness never draws anything itself. It passes read-only graphs to a
//! [`GraphRenderer`]; [`SnapshotRenderer`] persists them as JSON documents
//! that an external visualizer can load.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::{Color, Graph};

/// Error type for renderers.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Output could not be written.
    #[error("Failed to write render output: {0}")]
    Io(#[from] std::io::Error),
    /// Output could not be serialized.
    #[error("Failed to serialize render output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Consumer of graphs for visualization. Must not mutate its input.
pub trait GraphRenderer: Send + Sync {
    /// Persist an artifact for `graphs` and return where it went.
    fn render(&self, graphs: &[&Graph], label: &str) -> Result<PathBuf, RenderError>;
}

/// Writes every rendered set of graphs as one JSON file in a directory.
#[derive(Debug, Clone)]
pub struct SnapshotRenderer {
    out_dir: PathBuf,
}

#[derive(Serialize)]
struct SnapshotDocument<'a> {
    label: &'a str,
    generated_at: DateTime<Utc>,
    graphs: Vec<GraphSnapshot<'a>>,
}

#[derive(Serialize)]
struct GraphSnapshot<'a> {
    name: &'a str,
    description: &'a str,
    max_degree: usize,
    num_colors: usize,
    is_safe: bool,
    nodes: Vec<SnapshotNode<'a>>,
    edges: Vec<(&'a str, &'a str)>,
}

#[derive(Serialize)]
struct SnapshotNode<'a> {
    name: &'a str,
    color: Color,
}

impl<'a> GraphSnapshot<'a> {
    fn new(graph: &'a Graph) -> Self {
        let nodes = graph.nodes();
        Self {
            name: graph.name(),
            description: graph.description(),
            max_degree: graph.max_degree(),
            num_colors: graph.count_colors(),
            is_safe: graph.is_safe(),
            nodes: nodes
                .iter()
                .map(|n| SnapshotNode { name: n.name(), color: n.color() })
                .collect(),
            edges: graph
                .edges()
                .into_iter()
                .map(|(a, b)| (nodes[a.index()].name(), nodes[b.index()].name()))
                .collect(),
        }
    }
}

impl SnapshotRenderer {
    /// Render into `out_dir`, created on first use.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }

    /// Target directory.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl GraphRenderer for SnapshotRenderer {
    fn render(&self, graphs: &[&Graph], label: &str) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.out_dir)?;
        let now = Utc::now();
        let path = self
            .out_dir
            .join(format!("{}_{}.json", label, now.format("%H-%M-%S-%3f")));

        let document = SnapshotDocument {
            label,
            generated_at: now,
            graphs: graphs.iter().map(|g| GraphSnapshot::new(g)).collect(),
        };
        serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), &document)?;

        info!(path = %path.display(), graphs = graphs.len(), "snapshot written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GraphBuilder;

    #[test]
    fn test_snapshot_written() {
        let mut b = GraphBuilder::new("edge");
        let a = b.add_node("a", 0).unwrap();
        let c = b.add_node("c", 1).unwrap();
        b.add_edge(a, c).unwrap();
        let g = b.build().unwrap();

        let dir = std::env::temp_dir().join(format!("snapshot-{}", uuid::Uuid::new_v4()));
        let renderer = SnapshotRenderer::new(&dir);
        let path = renderer.render(&[&g, &g], "edge_test").unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["label"], "edge_test");
        assert_eq!(doc["graphs"].as_array().unwrap().len(), 2);
        assert_eq!(doc["graphs"][0]["edges"][0][0], "a");
        assert_eq!(doc["graphs"][0]["num_colors"], 2);

        fs::remove_dir_all(dir).unwrap();
    }
}
