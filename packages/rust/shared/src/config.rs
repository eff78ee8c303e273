//! Application configuration for SemScout.
//!
//! User config lives at `~/.semscout/semscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SemScoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "semscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".semscout";

// ---------------------------------------------------------------------------
// Config structs (matching semscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Websites to derive seed keywords from.
    #[serde(default)]
    pub sites: SitesConfig,

    /// Text-generation service settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Trend-signal fetch policy.
    #[serde(default)]
    pub trends: TrendsConfig,

    /// Output filtering and destination.
    #[serde(default)]
    pub output: OutputConfig,

    /// Seeds to fall back to when extraction yields nothing.
    #[serde(default)]
    pub fallback_seeds: Vec<String>,
}

/// `[sites]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitesConfig {
    /// Brand website URL (required).
    #[serde(default)]
    pub brand_url: String,

    /// Competitor website URL (required).
    #[serde(default)]
    pub competitor_url: String,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model to use for keyword extraction and expansion.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the chat-completions API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Maximum seed keywords to extract from the combined site text.
    #[serde(default = "default_max_seed_keywords")]
    pub max_seed_keywords: usize,

    /// Maximum generated keywords per seed during expansion.
    #[serde(default = "default_expansion_factor")]
    pub expansion_factor: usize,

    /// Character budget for the combined site text sent to the model.
    #[serde(default = "default_text_budget")]
    pub text_budget: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_llm_base_url(),
            max_seed_keywords: default_max_seed_keywords(),
            expansion_factor: default_expansion_factor(),
            text_budget: default_text_budget(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "google/gemini-2.0-flash-001".into()
}
fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_max_seed_keywords() -> usize {
    10
}
fn default_expansion_factor() -> usize {
    5
}
fn default_text_budget() -> usize {
    1000
}

/// `[trends]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsConfig {
    /// Base URL of the interest-over-time provider (required).
    #[serde(default)]
    pub endpoint: String,

    /// Geography code the signal is scoped to.
    #[serde(default = "default_geo")]
    pub geo: String,

    /// Attempts per batch before the batch is dropped.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base backoff in seconds; attempt n waits `backoff_secs * n`.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Keywords per provider request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Seconds to wait between successful batches.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            geo: default_geo(),
            retries: default_retries(),
            backoff_secs: default_backoff_secs(),
            batch_size: default_batch_size(),
            delay_secs: default_delay_secs(),
        }
    }
}

fn default_geo() -> String {
    "IN".into()
}
fn default_retries() -> u32 {
    3
}
fn default_backoff_secs() -> u64 {
    5
}
fn default_batch_size() -> usize {
    5
}
fn default_delay_secs() -> u64 {
    15
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Minimum trend score a keyword must reach to survive the merge filter.
    #[serde(default)]
    pub min_trends_score: f64,

    /// Directory the artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            min_trends_score: 0.0,
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "output".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.semscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SemScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.semscout/semscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SemScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SemScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SemScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SemScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SemScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check that both site URLs and the trends endpoint are present and parse.
///
/// Fails before any network activity so a misconfigured run never reaches
/// the providers.
pub fn validate_required(config: &AppConfig) -> Result<()> {
    if config.sites.brand_url.trim().is_empty() {
        return Err(SemScoutError::config(
            "brand website URL missing: set [sites] brand_url",
        ));
    }
    if config.sites.competitor_url.trim().is_empty() {
        return Err(SemScoutError::config(
            "competitor website URL missing: set [sites] competitor_url",
        ));
    }
    if config.trends.endpoint.trim().is_empty() {
        return Err(SemScoutError::config(
            "trends provider endpoint missing: set [trends] endpoint",
        ));
    }

    for (label, value) in [
        ("brand_url", &config.sites.brand_url),
        ("competitor_url", &config.sites.competitor_url),
        ("endpoint", &config.trends.endpoint),
    ] {
        url::Url::parse(value)
            .map_err(|e| SemScoutError::config(format!("invalid {label} '{value}': {e}")))?;
    }

    if config.trends.batch_size == 0 {
        return Err(SemScoutError::config("batch_size must be at least 1"));
    }

    Ok(())
}

/// Check that the text-generation API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.llm.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(SemScoutError::config(format!(
            "text-generation API key not found. Set the {var_name} environment variable."
        ))),
    }
}
