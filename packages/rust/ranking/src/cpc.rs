//! Cost-per-click estimation boundary.

use semscout_shared::CpcRecord;

/// Capability interface for a cost-per-click source.
///
/// The interface is partial: a real provider may have no estimate for a
/// keyword, and the merger keeps the keyword anyway with a null cost.
pub trait CpcEnricher {
    /// Estimate the cost-per-click for one keyword, if available.
    fn estimate(&self, keyword: &str) -> Option<CpcRecord>;
}

/// Offline estimator: a base rate plus a per-word increment, rounded to
/// cents. Total and deterministic — a stand-in until a real CPC source is
/// wired up.
#[derive(Debug, Clone)]
pub struct WordCountCpc {
    pub base: f64,
    pub per_word: f64,
}

impl Default for WordCountCpc {
    fn default() -> Self {
        Self {
            base: 0.5,
            per_word: 0.1,
        }
    }
}

impl CpcEnricher for WordCountCpc {
    fn estimate(&self, keyword: &str) -> Option<CpcRecord> {
        let words = keyword.split_whitespace().count();
        let cpc_usd = round_cents(self.base + self.per_word * words as f64);
        Some(CpcRecord {
            keyword: keyword.to_string(),
            cpc_usd,
        })
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
