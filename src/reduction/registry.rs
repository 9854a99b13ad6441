//! Algorithm registry and dispatcher.
//!
//! Maps [`AlgorithmId`]s to [`Reduction`] implementations. The registry is
//! built once by the caller and handed to the harness; there is no global
//! algorithm table.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{AlgorithmId, KwReduction, NaiveReduction, Reduction, ReductionError};
use crate::config::ReductionConfig;
use crate::types::Graph;

/// Registry of reductions keyed by id, iterated in id order.
#[derive(Clone, Default)]
pub struct ReductionRegistry {
    algorithms: BTreeMap<AlgorithmId, Arc<dyn Reduction>>,
}

impl ReductionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in algorithm under [`AlgorithmId::ALL`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(AlgorithmId::NAIVE, Arc::new(NaiveReduction));
        registry.register(AlgorithmId::KW, Arc::new(KwReduction));
        registry
    }

    /// Register an algorithm, returning the one it replaced.
    pub fn register(
        &mut self,
        id: AlgorithmId,
        algorithm: Arc<dyn Reduction>,
    ) -> Option<Arc<dyn Reduction>> {
        self.algorithms.insert(id, algorithm)
    }

    /// Look up an algorithm.
    pub fn resolve(&self, id: AlgorithmId) -> Result<Arc<dyn Reduction>, ReductionError> {
        self.algorithms
            .get(&id)
            .cloned()
            .ok_or(ReductionError::UnknownAlgorithm(id))
    }

    /// All registered ids in ascending order.
    pub fn ids(&self) -> Vec<AlgorithmId> {
        self.algorithms.keys().copied().collect()
    }

    /// Number of registered algorithms.
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    /// Run the algorithm registered under `id` on `graph`.
    ///
    /// Returns the reduced graph and the algorithm's name.
    pub async fn run_reduction(
        &self,
        graph: Graph,
        id: AlgorithmId,
        config: &ReductionConfig,
    ) -> Result<(Graph, &'static str), ReductionError> {
        let algorithm = self.resolve(id)?;
        debug!(algorithm = algorithm.name(), id = %id, graph = %graph.name(), "dispatching reduction");
        let reduced = algorithm.reduce(graph, config).await?;
        Ok((reduced, algorithm.name()))
    }
}

impl fmt::Debug for ReductionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.algorithms.iter().map(|(id, alg)| (id.0, alg.name())))
            .finish()
    }
}
