//! End-to-end run pipeline: sites → seeds → expansion → trend fetch →
//! merge → artifacts.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument, warn};
use url::Url;

use semscout_artifacts::WrittenArtifacts;
use semscout_ranking::CpcEnricher;
use semscout_shared::{
    CURRENT_SCHEMA_VERSION, Result, RunId, RunManifest, SemScoutError, dedup_keywords,
};
use semscout_sources::{SiteScraper, TextGenerator, truncate_text};
use semscout_trends::{CancelToken, FetchPolicy, TrendsProvider};

/// Configuration for one pipeline run, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Brand website to derive seeds from.
    pub brand_url: Url,
    /// Competitor website to derive seeds from.
    pub competitor_url: Url,
    /// Maximum seed keywords to extract.
    pub max_seed_keywords: usize,
    /// Maximum generated keywords per seed during expansion.
    pub expansion_factor: usize,
    /// Character budget for the combined site text.
    pub text_budget: usize,
    /// Seeds used when extraction yields nothing.
    pub fallback_seeds: Vec<String>,
    /// Keywords per trends request.
    pub batch_size: usize,
    /// Retry/backoff/throttle policy for the fetch stage.
    pub fetch: FetchPolicy,
    /// Minimum trend score a keyword must reach to survive the merge.
    pub min_trends_score: f64,
    /// Directory the artifacts are written to.
    pub output_dir: PathBuf,
    /// Tool version recorded in the manifest.
    pub tool_version: String,
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct RunReport {
    /// Run identifier, also recorded in the manifest.
    pub run_id: RunId,
    /// Seed keywords used (extracted or fallback).
    pub seed_count: usize,
    /// Keywords after expansion and de-duplication.
    pub expanded_count: usize,
    /// Rows in the final dataset.
    pub record_count: usize,
    /// Keywords for which no trend signal was obtained.
    pub missing_keywords: Vec<String>,
    /// Whether the fetch stage was cut short by cancellation.
    pub cancelled: bool,
    /// Written record artifacts.
    pub artifacts: WrittenArtifacts,
    /// Path of the written manifest.
    pub manifest_path: PathBuf,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run the full pipeline.
///
/// 1. Scrape both sites (failures degrade to empty text)
/// 2. Extract seed keywords, falling back to the configured list
/// 3. Expand and de-duplicate
/// 4. Fetch trend signals in batches
/// 5. Merge with CPC estimates
/// 6. Write artifacts and the run manifest
#[instrument(skip_all, fields(brand = %config.brand_url, competitor = %config.competitor_url))]
pub async fn run<G, P>(
    config: &RunConfig,
    generator: &G,
    provider: &P,
    cpc: &dyn CpcEnricher,
    cancel: &CancelToken,
    progress: &dyn ProgressReporter,
) -> Result<RunReport>
where
    G: TextGenerator,
    P: TrendsProvider,
{
    let start = Instant::now();
    let run_id = RunId::new();

    info!(%run_id, "starting keyword research run");

    // --- Phase 1: Scrape ---
    progress.phase("Scraping websites");
    let scraper = SiteScraper::new()?;

    let brand_text = scrape_or_empty(&scraper, &config.brand_url).await;
    let competitor_text = scrape_or_empty(&scraper, &config.competitor_url).await;
    let combined = truncate_text(
        &format!("{brand_text}\n{competitor_text}"),
        config.text_budget,
    );

    // --- Phase 2: Seed extraction ---
    progress.phase("Extracting seed keywords");
    let mut seeds =
        semscout_sources::extract_seeds(generator, &combined, config.max_seed_keywords).await;

    if seeds.is_empty() {
        warn!("no seed keywords extracted, using configured fallback seeds");
        seeds = dedup_keywords(config.fallback_seeds.iter().cloned());
    }
    if seeds.is_empty() {
        return Err(SemScoutError::validation(
            "no seed keywords available: extraction produced nothing and no fallback_seeds are configured",
        ));
    }

    // --- Phase 3: Expansion ---
    progress.phase("Expanding keywords");
    let expanded = semscout_sources::expand(generator, &seeds, config.expansion_factor).await;

    info!(
        seeds = seeds.len(),
        expanded = expanded.len(),
        "candidate keyword list ready"
    );

    // --- Phase 4: Trend fetch ---
    progress.phase("Fetching trend signals");
    let batches = semscout_trends::split(&expanded, config.batch_size)?;
    let fetch_report = semscout_trends::fetch(provider, &batches, &config.fetch, cancel).await;

    // --- Phase 5: Merge ---
    progress.phase("Merging and ranking");
    let records = semscout_ranking::merge(
        &fetch_report.records,
        cpc,
        config.min_trends_score,
        &expanded,
    );

    // --- Phase 6: Artifacts ---
    progress.phase("Writing artifacts");
    let artifacts = semscout_artifacts::write_records(&config.output_dir, &records)?;

    let missing_keywords: Vec<String> = fetch_report.missing.iter().cloned().collect();
    let manifest = RunManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        id: run_id.clone(),
        tool_version: config.tool_version.clone(),
        generated_at: chrono::Utc::now(),
        geo: config.fetch.geo.clone(),
        seed_count: seeds.len(),
        expanded_count: expanded.len(),
        record_count: records.len(),
        missing_keywords: missing_keywords.clone(),
        csv_sha256: artifacts.csv_sha256.clone(),
        json_sha256: artifacts.json_sha256.clone(),
    };
    let manifest_path = semscout_artifacts::write_manifest(&config.output_dir, &manifest)?;

    let report = RunReport {
        run_id,
        seed_count: seeds.len(),
        expanded_count: expanded.len(),
        record_count: records.len(),
        missing_keywords,
        cancelled: fetch_report.cancelled,
        artifacts,
        manifest_path,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        run_id = %report.run_id,
        records = report.record_count,
        missing = report.missing_keywords.len(),
        cancelled = report.cancelled,
        elapsed_ms = report.elapsed.as_millis(),
        "run complete"
    );

    Ok(report)
}

/// Scrape one site, degrading to empty text on failure.
async fn scrape_or_empty(scraper: &SiteScraper, url: &Url) -> String {
    match scraper.page_text(url).await {
        Ok(text) => text,
        Err(e) => {
            warn!(%url, error = %e, "scrape failed, continuing with empty text");
            String::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
