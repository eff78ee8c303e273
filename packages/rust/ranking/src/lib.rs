//! Merge and ranking stage for SemScout.
//!
//! Combines trend records with cost-per-click estimates under left-join
//! semantics, with a minimum-score filter and a keyword-only fallback when
//! the fetch stage produced no usable data.

pub mod cpc;
pub mod merge;

pub use cpc::{CpcEnricher, WordCountCpc};
pub use merge::merge;
