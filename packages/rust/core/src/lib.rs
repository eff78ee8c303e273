//! Pipeline orchestration for SemScout.
//!
//! Thin driver over the source, trends, ranking, and artifacts crates;
//! the interesting policy lives in those crates, this one sequences them.

pub mod pipeline;

pub use pipeline::{ProgressReporter, RunConfig, RunReport, SilentProgress, run};
