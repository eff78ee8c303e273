//! Merge trend scores with cost estimates into the final record set.

use tracing::{debug, info, warn};

use semscout_shared::{FinalRecord, TrendRecord};

use crate::cpc::CpcEnricher;

/// Build the final record set from trend records and a CPC source.
///
/// 1. Drop trend records scoring below `min_score`.
/// 2. If nothing survives, fall back to keyword-only records built from
///    `fallback_keywords` (the caller's pre-fetch list) so a run with no
///    usable signal still emits a dataset.
/// 3. Left-join the survivors with CPC estimates; a missing estimate keeps
///    the keyword and leaves `cpc_usd` null.
///
/// Output order is the filtered trend-record order, making the result
/// deterministic for identical inputs.
pub fn merge(
    trend_records: &[TrendRecord],
    cpc: &dyn CpcEnricher,
    min_score: f64,
    fallback_keywords: &[String],
) -> Vec<FinalRecord> {
    let filtered: Vec<&TrendRecord> = trend_records
        .iter()
        .filter(|r| r.trends_score >= min_score)
        .collect();

    debug!(
        total = trend_records.len(),
        surviving = filtered.len(),
        min_score,
        "applied trend-score filter"
    );

    if filtered.is_empty() {
        warn!(
            keywords = fallback_keywords.len(),
            "no usable trend data, emitting keyword-only records"
        );
        return fallback_keywords
            .iter()
            .map(|kw| FinalRecord {
                keyword: kw.clone(),
                trends_score: None,
                cpc_usd: None,
            })
            .collect();
    }

    let mut without_cpc = 0usize;
    let records: Vec<FinalRecord> = filtered
        .into_iter()
        .map(|trend| {
            let cpc_usd = match cpc.estimate(&trend.keyword) {
                Some(record) => Some(record.cpc_usd),
                None => {
                    without_cpc += 1;
                    None
                }
            };
            FinalRecord {
                keyword: trend.keyword.clone(),
                trends_score: Some(trend.trends_score),
                cpc_usd,
            }
        })
        .collect();

    info!(
        records = records.len(),
        without_cpc, "merged trend and cost data"
    );

    records
}
