//! Shared types, error model, and configuration for SemScout.
//!
//! This crate is the foundation depended on by all other SemScout crates.
//! It provides:
//! - [`SemScoutError`] — the unified error type
//! - Domain types ([`TrendRecord`], [`CpcRecord`], [`FinalRecord`], [`RunId`], [`RunManifest`])
//! - Configuration ([`AppConfig`], config loading and validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LlmConfig, OutputConfig, SitesConfig, TrendsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_api_key, validate_required,
};
pub use error::{Result, SemScoutError};
pub use types::{
    CURRENT_SCHEMA_VERSION, CpcRecord, FinalRecord, RunId, RunManifest, TrendRecord,
    dedup_keywords,
};
