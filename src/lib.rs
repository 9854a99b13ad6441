//! # color-reduction
//!
//! Reduction of proper vertex colorings toward the Δ+1 bound.
//!
//! Given a graph whose nodes already carry a proper (possibly wasteful)
//! coloring, rewrite the colors so adjacent nodes still differ while using
//! as few colors as possible.
//!
//! ## Architecture
//!
//! ```text
//! graph file → parser → Graph ──deep_copy──→ ReductionRegistry → Reduction → TestRecord
//!                                                  │
//!                                   Naive ─────────┤
//!                                   KW ── MergePool (fixed workers)
//! ```
//!
//! ## Guarantees
//!
//! - A proper input coloring stays proper under every built-in reduction
//! - KW returns at most Δ+1 colors when the declared Δ is accurate
//! - Results are deterministic for a given node order, independent of pool size

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod config;
pub mod canonical;
pub mod parser;
pub mod reduction;
pub mod harness;
pub mod telemetry;

// Re-exports
pub use types::{Adjacency, Color, Graph, GraphBuilder, GraphError, Node, NodeId};
pub use config::{DebugFlags, ReductionConfig, DEFAULT_MAX_ROUNDS};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use parser::{parse_file, parse_str, GraphFile, NodeEntry, ParseError};
pub use reduction::{
    AlgorithmId, KwReduction, NaiveReduction, Reduction, ReductionError, ReductionRegistry,
};
pub use reduction::pool::{Bin, MergePool};
pub use harness::{
    GraphRenderer, HarnessError, RenderError, SnapshotRenderer, TestHarness, TestRecord,
    TestSummary,
};
pub use telemetry::{init_tracing, LogFormat};
