//! Test runner: parse once, then time every requested algorithm on its own
//! deep copy of the initially colored graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::render::{GraphRenderer, RenderError};
use crate::config::ReductionConfig;
use crate::parser::{parse_file, ParseError};
use crate::reduction::{AlgorithmId, ReductionError, ReductionRegistry};
use crate::types::Graph;

/// Error type for harness runs.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The graph file could not be loaded.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// A reduction could not be dispatched or failed.
    #[error("Reduction error: {0}")]
    Reduction(#[from] ReductionError),
    /// The renderer failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Outcome of one algorithm on one graph.
#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    /// `<graph>_<algorithm>`.
    pub name: String,
    /// Algorithm that produced the output.
    pub algorithm: AlgorithmId,
    /// Wall time of the reduction alone.
    pub duration: Duration,
    /// Reduced graph.
    pub output: Graph,
    /// Distinct colors in the output.
    pub num_colors: usize,
    /// Whether the output coloring is proper.
    pub is_safe: bool,
    /// Fingerprint of the output coloring.
    pub fingerprint: String,
    /// When the reduction started.
    pub started_at: DateTime<Utc>,
}

/// Compact, graph-free view of a [`TestRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    /// `<graph>_<algorithm>`.
    pub name: String,
    /// Algorithm id.
    pub algorithm: AlgorithmId,
    /// Duration in microseconds.
    pub duration_micros: u64,
    /// Distinct colors in the output.
    pub num_colors: usize,
    /// The Δ+1 target for this graph.
    pub color_bound: usize,
    /// Whether the output coloring is proper.
    pub is_safe: bool,
    /// Fingerprint of the output coloring.
    pub fingerprint: String,
    /// When the reduction started.
    pub started_at: DateTime<Utc>,
}

impl TestRecord {
    /// Summarize without the output graph.
    pub fn summary(&self) -> TestSummary {
        TestSummary {
            name: self.name.clone(),
            algorithm: self.algorithm,
            duration_micros: self.duration.as_micros() as u64,
            num_colors: self.num_colors,
            color_bound: self.output.color_bound(),
            is_safe: self.is_safe,
            fingerprint: self.fingerprint.clone(),
            started_at: self.started_at,
        }
    }

    /// True if the output is proper and within Δ+1 colors.
    pub fn meets_bound(&self) -> bool {
        self.is_safe && self.num_colors <= self.output.color_bound()
    }
}

/// Runs reductions from a registry and validates their output.
pub struct TestHarness {
    registry: Arc<ReductionRegistry>,
    renderer: Option<Arc<dyn GraphRenderer>>,
}

impl TestHarness {
    /// Create a harness over `registry`.
    pub fn new(registry: Arc<ReductionRegistry>) -> Self {
        Self { registry, renderer: None }
    }

    /// Attach a renderer used when `debug.visualize` is set.
    pub fn with_renderer(mut self, renderer: Arc<dyn GraphRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// The registry algorithms are drawn from.
    pub fn registry(&self) -> &ReductionRegistry {
        &self.registry
    }

    /// Parse `path`, apply the trivial coloring, and run `ids` on it.
    ///
    /// An empty `ids` runs every registered algorithm.
    pub async fn run_test(
        &self,
        path: impl AsRef<Path>,
        ids: &[AlgorithmId],
        config: &ReductionConfig,
    ) -> Result<Vec<TestRecord>, HarnessError> {
        let mut graph = parse_file(path, false)?;
        if config.debug.trace {
            info!(
                graph = %graph.name(),
                is_safe = graph.is_safe(),
                "initial safety before color init"
            );
        }
        graph.run_color_init();
        self.run_graph(&graph, ids, config).await
    }

    /// Run `ids` on independent copies of `initial`.
    ///
    /// Every id is resolved before anything runs, so an unknown id fails the
    /// whole call and yields no records.
    pub async fn run_graph(
        &self,
        initial: &Graph,
        ids: &[AlgorithmId],
        config: &ReductionConfig,
    ) -> Result<Vec<TestRecord>, HarnessError> {
        config.validate()?;
        let ids = if ids.is_empty() { self.registry.ids() } else { ids.to_vec() };
        for &id in &ids {
            self.registry.resolve(id)?;
        }

        let span = info_span!(
            "color_test",
            run_id = %Uuid::new_v4(),
            graph = %initial.name(),
            params = %config.params_hash(),
        );

        async move {
            let mut records = Vec::with_capacity(ids.len());
            for id in ids {
                let copy = initial.deep_copy();
                let started_at = Utc::now();
                let start = Instant::now();
                let (output, algorithm) = self.registry.run_reduction(copy, id, config).await?;
                let duration = start.elapsed();

                let record = TestRecord {
                    name: format!("{}_{}", initial.name(), algorithm),
                    algorithm: id,
                    duration,
                    num_colors: output.count_colors(),
                    is_safe: output.is_safe(),
                    fingerprint: output.coloring_fingerprint(),
                    output,
                    started_at,
                };

                if config.debug.trace {
                    info!(
                        test = %record.name,
                        elapsed_ns = duration.as_nanos() as u64,
                        is_safe = record.is_safe,
                        num_colors = record.num_colors,
                        "reduction finished"
                    );
                }

                if config.debug.visualize {
                    if let Some(renderer) = &self.renderer {
                        renderer.render(&[initial, &record.output], &record.name)?;
                    }
                }
                records.push(record);
            }
            Ok::<_, HarnessError>(records)
        }
        .instrument(span)
        .await
    }
}
