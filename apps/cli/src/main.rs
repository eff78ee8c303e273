//! SemScout CLI — keyword research for search-advertising campaigns.
//!
//! Derives candidate keywords from two websites, enriches them with trend
//! and cost signals, and writes a ranked dataset.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
