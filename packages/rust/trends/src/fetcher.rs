//! Batched, throttled, retrying trend-signal fetcher.
//!
//! Batches are processed strictly sequentially: the provider's rate limit
//! is interval-based, so concurrent requests would defeat the throttle.
//! Each batch moves through Pending → Attempting → {Succeeded, Exhausted};
//! a failed batch never aborts the run, it only withholds its keywords.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use semscout_shared::{TrendRecord, TrendsConfig};

use crate::cancel::CancelToken;
use crate::provider::{InterestTable, TrendsProvider};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Retry, backoff, and throttle policy for one fetch run.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Geography code sent with every request.
    pub geo: String,
    /// Attempts per batch before it is dropped. Zero means no attempts.
    pub retries: u32,
    /// Base backoff; the wait after failed attempt `n` is `backoff × n`.
    pub backoff: Duration,
    /// Pause inserted after a successful batch that is not the last one.
    pub batch_delay: Duration,
}

impl From<&TrendsConfig> for FetchPolicy {
    fn from(config: &TrendsConfig) -> Self {
        Self {
            geo: config.geo.clone(),
            retries: config.retries,
            backoff: Duration::from_secs(config.backoff_secs),
            batch_delay: Duration::from_secs(config.delay_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of one fetch run.
///
/// `missing` is the set of keywords for which no record was produced, so
/// callers can tell "no signal" apart from "filtered out" downstream.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// One record per keyword the provider returned data for.
    pub records: Vec<TrendRecord>,
    /// Keywords absent from responses or belonging to dropped batches.
    pub missing: BTreeSet<String>,
    /// Batches that produced a usable response.
    pub batches_succeeded: usize,
    /// Batches dropped after exhausting their retries.
    pub batches_exhausted: usize,
    /// Whether the run was cut short by cancellation.
    pub cancelled: bool,
}

enum BatchOutcome {
    Succeeded(InterestTable),
    Exhausted,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Fetch loop
// ---------------------------------------------------------------------------

/// Fetch interest data for every batch, tolerating per-batch failure.
///
/// Never fails as a whole: partial data loss is reported in the returned
/// [`FetchReport`], not as an error. On cancellation, records accumulated
/// for completed batches remain valid and are returned.
#[instrument(skip_all, fields(batches = batches.len(), geo = %policy.geo))]
pub async fn fetch<P: TrendsProvider>(
    provider: &P,
    batches: &[Vec<String>],
    policy: &FetchPolicy,
    cancel: &CancelToken,
) -> FetchReport {
    let total = batches.len();
    let mut report = FetchReport::default();

    info!(
        batches = total,
        retries = policy.retries,
        backoff_secs = policy.backoff.as_secs_f64(),
        delay_secs = policy.batch_delay.as_secs_f64(),
        "starting trend fetch"
    );

    for (index, batch) in batches.iter().enumerate() {
        if cancel.is_cancelled() {
            abandon(&mut report, &batches[index..]);
            break;
        }

        match fetch_batch(provider, batch, index + 1, total, policy, cancel).await {
            BatchOutcome::Succeeded(table) => {
                collect_records(batch, &table, &mut report);
                report.batches_succeeded += 1;

                // Throttle between consecutive requests; the last batch has
                // nothing after it to space out.
                let is_last = index + 1 == total;
                if !is_last && !policy.batch_delay.is_zero() {
                    debug!(
                        delay_secs = policy.batch_delay.as_secs_f64(),
                        "throttling before next batch"
                    );
                    if cancel.sleep(policy.batch_delay).await {
                        abandon(&mut report, &batches[index + 1..]);
                        break;
                    }
                }
            }
            BatchOutcome::Exhausted => {
                warn!(
                    batch = index + 1,
                    retries = policy.retries,
                    "dropping batch after exhausting retries"
                );
                report.missing.extend(batch.iter().cloned());
                report.batches_exhausted += 1;
            }
            BatchOutcome::Cancelled => {
                abandon(&mut report, &batches[index..]);
                break;
            }
        }
    }

    info!(
        records = report.records.len(),
        missing = report.missing.len(),
        succeeded = report.batches_succeeded,
        exhausted = report.batches_exhausted,
        cancelled = report.cancelled,
        "trend fetch finished"
    );

    report
}

/// Drive one batch through its attempt loop.
async fn fetch_batch<P: TrendsProvider>(
    provider: &P,
    batch: &[String],
    number: usize,
    total: usize,
    policy: &FetchPolicy,
    cancel: &CancelToken,
) -> BatchOutcome {
    let mut attempt: u32 = 0;

    loop {
        if attempt == policy.retries {
            return BatchOutcome::Exhausted;
        }
        attempt += 1;

        debug!(
            batch = number,
            total,
            attempt,
            keywords = batch.len(),
            "requesting interest data"
        );

        match provider.interest_over_time(batch, &policy.geo).await {
            Ok(table) if !table.series.is_empty() => return BatchOutcome::Succeeded(table),
            // An empty table is indistinguishable from a throttled or broken
            // response, so it goes through the retry path.
            Ok(_) => warn!(batch = number, attempt, "provider returned an empty table"),
            Err(e) => warn!(batch = number, attempt, error = %e, "batch request failed"),
        }

        if attempt < policy.retries {
            let wait = policy.backoff * attempt;
            info!(
                batch = number,
                attempt,
                wait_secs = wait.as_secs_f64(),
                "backing off before retry"
            );
            if cancel.sleep(wait).await {
                return BatchOutcome::Cancelled;
            }
        }
    }
}

/// Turn a successful response into records, noting absent keywords.
fn collect_records(batch: &[String], table: &InterestTable, report: &mut FetchReport) {
    for keyword in batch {
        match table.series.get(keyword) {
            Some(points) if !points.is_empty() => {
                let score = points.iter().sum::<f64>() / points.len() as f64;
                report.records.push(TrendRecord {
                    keyword: keyword.clone(),
                    trends_score: score,
                });
            }
            _ => {
                warn!(keyword = %keyword, "keyword absent from provider response");
                report.missing.insert(keyword.clone());
            }
        }
    }
}

/// Mark the run cancelled and record every not-yet-fetched keyword as missing.
fn abandon(report: &mut FetchReport, remaining: &[Vec<String>]) {
    report.cancelled = true;
    report
        .missing
        .extend(remaining.iter().flatten().cloned());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use semscout_shared::{Result, SemScoutError};

    use super::*;
    use crate::cancel;

    /// Fake provider that replays a scripted sequence of responses and
    /// records every call it receives.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<InterestTable>>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<InterestTable>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl TrendsProvider for ScriptedProvider {
        async fn interest_over_time(
            &self,
            keywords: &[String],
            _geo: &str,
        ) -> Result<InterestTable> {
            self.calls.lock().unwrap().push(keywords.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SemScoutError::Provider("script exhausted".into())))
        }
    }

    fn table(entries: &[(&str, &[f64])]) -> InterestTable {
        InterestTable {
            series: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_vec()))
                .collect(),
        }
    }

    fn full_table(keywords: &[&str]) -> InterestTable {
        InterestTable {
            series: keywords
                .iter()
                .map(|k| (k.to_string(), vec![50.0]))
                .collect(),
        }
    }

    fn batches(groups: &[&[&str]]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|k| k.to_string()).collect())
            .collect()
    }

    fn policy(retries: u32, backoff_secs: u64, delay_secs: u64) -> FetchPolicy {
        FetchPolicy {
            geo: "IN".into(),
            retries,
            backoff: Duration::from_secs(backoff_secs),
            batch_delay: Duration::from_secs(delay_secs),
        }
    }

    fn err() -> Result<InterestTable> {
        Err(SemScoutError::Network("connection reset".into()))
    }

    #[tokio::test]
    async fn complete_success_yields_one_record_per_keyword() {
        let provider = ScriptedProvider::new(vec![
            Ok(table(&[("a", &[10.0, 20.0]), ("b", &[30.0])])),
            Ok(table(&[("c", &[0.0, 100.0])])),
        ]);
        let (_handle, token) = cancel::channel();

        let report = fetch(
            &provider,
            &batches(&[&["a", "b"], &["c"]]),
            &policy(3, 0, 0),
            &token,
        )
        .await;

        assert_eq!(report.records.len(), 3);
        assert!(report.missing.is_empty());
        assert_eq!(report.batches_succeeded, 2);
        assert_eq!(report.batches_exhausted, 0);
        assert!(!report.cancelled);

        let score_of = |kw: &str| {
            report
                .records
                .iter()
                .find(|r| r.keyword == kw)
                .unwrap()
                .trends_score
        };
        assert_eq!(score_of("a"), 15.0);
        assert_eq!(score_of("b"), 30.0);
        assert_eq!(score_of("c"), 50.0);
    }

    #[tokio::test]
    async fn exhausted_batch_is_isolated_from_the_rest() {
        // Batch 2 fails all three attempts; batches 1 and 3 are untouched.
        let provider = ScriptedProvider::new(vec![
            Ok(full_table(&["p", "q"])),
            err(),
            err(),
            err(),
            Ok(full_table(&["t", "u"])),
        ]);
        let (_handle, token) = cancel::channel();

        let report = fetch(
            &provider,
            &batches(&[&["p", "q"], &["r", "s"], &["t", "u"]]),
            &policy(3, 0, 0),
            &token,
        )
        .await;

        let produced: BTreeSet<&str> = report.records.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(produced, BTreeSet::from(["p", "q", "t", "u"]));
        assert_eq!(report.missing, BTreeSet::from(["r".into(), "s".into()]));
        assert_eq!(report.batches_succeeded, 2);
        assert_eq!(report.batches_exhausted, 1);
        assert_eq!(provider.call_count(), 5);
    }

    #[tokio::test]
    async fn empty_table_is_retried_like_a_failure() {
        let provider = ScriptedProvider::new(vec![
            Ok(InterestTable::default()),
            Ok(full_table(&["a"])),
        ]);
        let (_handle, token) = cancel::channel();

        let report = fetch(&provider, &batches(&[&["a"]]), &policy(3, 0, 0), &token).await;

        assert_eq!(provider.call_count(), 2);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.batches_succeeded, 1);
    }

    #[tokio::test]
    async fn partial_response_drops_only_absent_keywords() {
        let provider = ScriptedProvider::new(vec![Ok(table(&[("a", &[70.0])]))]);
        let (_handle, token) = cancel::channel();

        let report = fetch(
            &provider,
            &batches(&[&["a", "b"]]),
            &policy(3, 0, 0),
            &token,
        )
        .await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].keyword, "a");
        assert_eq!(report.missing, BTreeSet::from(["b".into()]));
        assert_eq!(report.batches_succeeded, 1);
    }

    #[tokio::test]
    async fn empty_series_counts_as_absent() {
        let provider = ScriptedProvider::new(vec![Ok(table(&[("a", &[70.0]), ("b", &[])]))]);
        let (_handle, token) = cancel::channel();

        let report = fetch(
            &provider,
            &batches(&[&["a", "b"]]),
            &policy(3, 0, 0),
            &token,
        )
        .await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.missing, BTreeSet::from(["b".into()]));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_schedule_is_linear() {
        // Three attempts, waits of 5s and 10s between them, none after the last.
        let provider = ScriptedProvider::new(vec![err(), err(), err()]);
        let (_handle, token) = cancel::channel();
        let start = tokio::time::Instant::now();

        let report = fetch(&provider, &batches(&[&["a"]]), &policy(3, 5, 0), &token).await;

        assert_eq!(start.elapsed(), Duration::from_secs(15));
        assert_eq!(provider.call_count(), 3);
        assert_eq!(report.batches_exhausted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_runs_between_batches_but_not_after_the_last() {
        let provider = ScriptedProvider::new(vec![
            Ok(full_table(&["a"])),
            Ok(full_table(&["b"])),
        ]);
        let (_handle, token) = cancel::channel();
        let start = tokio::time::Instant::now();

        let report = fetch(
            &provider,
            &batches(&[&["a"], &["b"]]),
            &policy(3, 0, 15),
            &token,
        )
        .await;

        // Exactly one inter-batch delay.
        assert_eq!(start.elapsed(), Duration::from_secs(15));
        assert_eq!(report.batches_succeeded, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn no_delay_after_an_exhausted_batch() {
        // Batch 1 burns its single attempt and is dropped; no throttle should
        // run before batch 2.
        let provider = ScriptedProvider::new(vec![err(), Ok(full_table(&["b"]))]);
        let (_handle, token) = cancel::channel();
        let start = tokio::time::Instant::now();

        let report = fetch(
            &provider,
            &batches(&[&["a"], &["b"]]),
            &policy(1, 5, 15),
            &token,
        )
        .await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(report.batches_exhausted, 1);
        assert_eq!(report.batches_succeeded, 1);
    }

    #[tokio::test]
    async fn zero_retries_never_calls_the_provider() {
        let provider = ScriptedProvider::new(vec![]);
        let (_handle, token) = cancel::channel();

        let report = fetch(
            &provider,
            &batches(&[&["a"], &["b", "c"]]),
            &policy(0, 5, 15),
            &token,
        )
        .await;

        assert_eq!(provider.call_count(), 0);
        assert!(report.records.is_empty());
        assert_eq!(
            report.missing,
            BTreeSet::from(["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(report.batches_exhausted, 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_fetches_nothing() {
        let provider = ScriptedProvider::new(vec![Ok(full_table(&["a"]))]);
        let (handle, token) = cancel::channel();
        handle.cancel();

        let report = fetch(&provider, &batches(&[&["a"]]), &policy(3, 0, 0), &token).await;

        assert_eq!(provider.call_count(), 0);
        assert!(report.cancelled);
        assert_eq!(report.missing, BTreeSet::from(["a".into()]));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_throttle_keeps_completed_batches() {
        let provider = ScriptedProvider::new(vec![Ok(full_table(&["a"]))]);
        let (handle, token) = cancel::channel();

        let bs = batches(&[&["a"], &["b"]]);
        let pol = policy(3, 0, 15);
        let (report, ()) = tokio::join!(
            fetch(&provider, &bs, &pol, &token),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                handle.cancel();
            }
        );

        assert!(report.cancelled);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].keyword, "a");
        assert_eq!(report.missing, BTreeSet::from(["b".into()]));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_backoff_abandons_the_current_batch() {
        let provider = ScriptedProvider::new(vec![err()]);
        let (handle, token) = cancel::channel();

        let bs = batches(&[&["a"]]);
        let pol = policy(3, 10, 0);
        let (report, ()) = tokio::join!(
            fetch(&provider, &bs, &pol, &token),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                handle.cancel();
            }
        );

        assert!(report.cancelled);
        assert!(report.records.is_empty());
        assert_eq!(report.missing, BTreeSet::from(["a".into()]));
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn policy_from_config() {
        let config = TrendsConfig::default();
        let policy = FetchPolicy::from(&config);
        assert_eq!(policy.geo, "IN");
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.backoff, Duration::from_secs(5));
        assert_eq!(policy.batch_delay, Duration::from_secs(15));
    }
}
