//! Test harness: timing, validation and optional rendering of reductions.

pub mod render;
pub mod runner;

pub use render::{GraphRenderer, RenderError, SnapshotRenderer};
pub use runner::{HarnessError, TestHarness, TestRecord, TestSummary};
