//! Batched trend-signal fetching for SemScout.
//!
//! The fetch stage takes an arbitrary-size keyword list, splits it into
//! fixed-size batches, and asks a quota-limited external provider for each
//! batch's 12-month interest series — retrying with linear backoff, pausing
//! between successful batches, and treating per-batch failure as data loss
//! rather than a run failure.

pub mod batch;
pub mod cancel;
pub mod fetcher;
pub mod provider;

pub use batch::split;
pub use cancel::{CancelHandle, CancelToken};
pub use fetcher::{FetchPolicy, FetchReport, fetch};
pub use provider::{HttpTrendsProvider, InterestTable, LOOKBACK_WINDOW, TrendsProvider};
