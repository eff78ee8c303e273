//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

use semscout_core::{ProgressReporter, RunConfig, RunReport};
use semscout_ranking::WordCountCpc;
use semscout_shared::{
    AppConfig, init_config, load_config, load_config_from, validate_api_key, validate_required,
};
use semscout_sources::OpenRouterClient;
use semscout_trends::{FetchPolicy, HttpTrendsProvider, cancel};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SemScout — turn two websites into a ranked keyword dataset.
#[derive(Parser)]
#[command(
    name = "semscout",
    version,
    about = "Derive, expand, and rank search-advertising keywords from brand and competitor websites.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a config file (defaults to ~/.semscout/semscout.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the keyword research pipeline and write the dataset.
    Run {
        /// Brand website URL (overrides [sites] brand_url).
        #[arg(long)]
        brand: Option<String>,

        /// Competitor website URL (overrides [sites] competitor_url).
        #[arg(long)]
        competitor: Option<String>,

        /// Geography code for the trend signal (overrides [trends] geo).
        #[arg(long)]
        geo: Option<String>,

        /// Keywords per trends request (overrides [trends] batch_size).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Minimum trend score to keep a keyword (overrides [output] min_trends_score).
        #[arg(long)]
        min_score: Option<f64>,

        /// Output directory (overrides [output] output_dir).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "semscout=info",
        1 => "semscout=debug",
        _ => "semscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    match cli.command {
        Command::Run {
            brand,
            competitor,
            geo,
            batch_size,
            min_score,
            out,
        } => {
            cmd_run(
                config_path.as_deref(),
                brand.as_deref(),
                competitor.as_deref(),
                geo.as_deref(),
                batch_size,
                min_score,
                out.as_deref(),
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn load(config_path: Option<&std::path::Path>) -> Result<AppConfig> {
    Ok(match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

#[allow(clippy::too_many_arguments)]
async fn cmd_run(
    config_path: Option<&std::path::Path>,
    brand: Option<&str>,
    competitor: Option<&str>,
    geo: Option<&str>,
    batch_size: Option<usize>,
    min_score: Option<f64>,
    out: Option<&str>,
) -> Result<()> {
    let mut config = load(config_path)?;

    // CLI flags win over config file values.
    if let Some(brand) = brand {
        config.sites.brand_url = brand.to_string();
    }
    if let Some(competitor) = competitor {
        config.sites.competitor_url = competitor.to_string();
    }
    if let Some(geo) = geo {
        config.trends.geo = geo.to_string();
    }
    if let Some(batch_size) = batch_size {
        config.trends.batch_size = batch_size;
    }
    if let Some(min_score) = min_score {
        config.output.min_trends_score = min_score;
    }
    if let Some(out) = out {
        config.output.output_dir = out.to_string();
    }

    // Fail on bad config before any network activity.
    validate_required(&config)?;
    let api_key = validate_api_key(&config)?;

    let brand_url = Url::parse(&config.sites.brand_url)
        .map_err(|e| eyre!("invalid brand URL '{}': {e}", config.sites.brand_url))?;
    let competitor_url = Url::parse(&config.sites.competitor_url)
        .map_err(|e| eyre!("invalid competitor URL '{}': {e}", config.sites.competitor_url))?;

    let run_config = RunConfig {
        brand_url,
        competitor_url,
        max_seed_keywords: config.llm.max_seed_keywords,
        expansion_factor: config.llm.expansion_factor,
        text_budget: config.llm.text_budget,
        fallback_seeds: config.fallback_seeds.clone(),
        batch_size: config.trends.batch_size,
        fetch: FetchPolicy::from(&config.trends),
        min_trends_score: config.output.min_trends_score,
        output_dir: PathBuf::from(&config.output.output_dir),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let generator = OpenRouterClient::new(
        config.llm.base_url.as_str(),
        api_key,
        config.llm.model.as_str(),
    )?;
    let provider = HttpTrendsProvider::new(config.trends.endpoint.as_str())?;
    let cpc = WordCountCpc::default();

    // Ctrl-C drains the fetch loop instead of killing the process: batches
    // already fetched still make it into the artifacts.
    let (cancel_handle, cancel_token) = cancel::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing with the data fetched so far");
            cancel_handle.cancel();
        }
    });

    info!(
        brand = %config.sites.brand_url,
        competitor = %config.sites.competitor_url,
        geo = %config.trends.geo,
        "starting keyword research"
    );

    let reporter = CliProgress::new();
    let report = semscout_core::run(
        &run_config,
        &generator,
        &provider,
        &cpc,
        &cancel_token,
        &reporter,
    )
    .await?;

    // Print summary
    println!();
    if report.cancelled {
        println!("  Run interrupted, partial dataset written.");
    } else {
        println!("  Keyword dataset written successfully!");
    }
    println!("  Run ID:    {}", report.run_id);
    println!("  Seeds:     {}", report.seed_count);
    println!("  Expanded:  {}", report.expanded_count);
    println!("  Records:   {}", report.record_count);
    if !report.missing_keywords.is_empty() {
        println!("  No signal: {}", report.missing_keywords.len());
    }
    println!("  CSV:       {}", report.artifacts.csv_path.display());
    println!("  JSON:      {}", report.artifacts.json_path.display());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
