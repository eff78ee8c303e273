//! Core domain types for SemScout keyword datasets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for the run manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Popularity signal for one keyword: the mean of its 12-month interest
/// series (0–100) in one geography.
///
/// A keyword the provider returned no data for gets *no* record — a missing
/// record and a zero score mean different things downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub keyword: String,
    pub trends_score: f64,
}

/// Estimated cost-per-click for one keyword, in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpcRecord {
    pub keyword: String,
    pub cpc_usd: f64,
}

/// One row of the final ranked dataset.
///
/// Built once per run from the left-outer-join of trend and CPC records and
/// serialized immediately; both signal fields are nullable because the
/// fallback path emits keyword-only rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRecord {
    pub keyword: String,
    pub trends_score: Option<f64>,
    pub cpc_usd: Option<f64>,
}

// ---------------------------------------------------------------------------
// RunManifest
// ---------------------------------------------------------------------------

/// The `manifest.json` structure written beside the record artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Unique identifier for this run.
    pub id: RunId,
    /// Tool version that produced the artifacts.
    pub tool_version: String,
    /// When the artifacts were written.
    pub generated_at: DateTime<Utc>,
    /// Geography the trend signal was fetched for.
    pub geo: String,
    /// Number of seed keywords after extraction (or fallback).
    pub seed_count: usize,
    /// Number of keywords after expansion and de-duplication.
    pub expanded_count: usize,
    /// Number of rows in the final dataset.
    pub record_count: usize,
    /// Keywords for which no trend signal was obtained.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_keywords: Vec<String>,
    /// SHA-256 of the CSV artifact.
    pub csv_sha256: String,
    /// SHA-256 of the JSON artifact.
    pub json_sha256: String,
}

// ---------------------------------------------------------------------------
// Keyword helpers
// ---------------------------------------------------------------------------

/// De-duplicate a keyword list by exact string match, preserving
/// first-occurrence order and dropping empty or whitespace-only tokens.
///
/// No normalization is applied: `"Whey Protein"` and `"whey protein"` are
/// distinct keywords.
pub fn dedup_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for kw in keywords {
        let kw: String = kw.into();
        if kw.trim().is_empty() {
            continue;
        }
        if seen.insert(kw.clone()) {
            out.push(kw);
        }
    }
    out
}
