//! Color reduction algorithms.
//!
//! Every algorithm implements [`Reduction`]: it takes ownership of a
//! properly colored graph and returns a (hopefully) smaller proper coloring.
//! Algorithms are looked up by [`AlgorithmId`] through a
//! [`ReductionRegistry`] built once by the caller.

pub mod kw;
pub mod naive;
pub mod pool;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ReductionConfig;
use crate::types::Graph;

pub use kw::KwReduction;
pub use naive::NaiveReduction;
pub use registry::ReductionRegistry;

/// Identifier of a registered reduction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlgorithmId(pub u32);

impl AlgorithmId {
    /// Single-unit greedy reduction.
    pub const NAIVE: AlgorithmId = AlgorithmId(0);
    /// Parallel bin merge reduction.
    pub const KW: AlgorithmId = AlgorithmId(1);
    /// Every built-in algorithm.
    pub const ALL: [AlgorithmId; 2] = [Self::NAIVE, Self::KW];
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for reductions and the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ReductionError {
    /// No algorithm registered under this id.
    #[error("Unknown algorithm id: {0}")]
    UnknownAlgorithm(AlgorithmId),
    /// A worker task panicked or was aborted.
    #[error("Worker failed: {0}")]
    Worker(String),
    /// The worker pool stopped accepting jobs.
    #[error("Worker pool closed before the round completed")]
    PoolClosed,
    /// Configuration cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<tokio::task::JoinError> for ReductionError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Worker(e.to_string())
    }
}

/// A color reduction algorithm.
///
/// Implementations must return a proper coloring whenever they receive one.
#[async_trait]
pub trait Reduction: Send + Sync {
    /// Short name used in result records.
    fn name(&self) -> &'static str;

    /// Reduce the coloring of `graph`.
    async fn reduce(&self, graph: Graph, config: &ReductionConfig) -> Result<Graph, ReductionError>;
}
