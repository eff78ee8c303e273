//! External collaborators for SemScout: website scraping and the
//! text-generation service used for seed extraction and keyword expansion.
//!
//! Everything in this crate degrades gracefully — scrape and generation
//! failures fall back to documented defaults instead of failing the run.

pub mod keywords;
pub mod llm;
pub mod scrape;

pub use keywords::{expand, extract_seeds};
pub use llm::{OpenRouterClient, TextGenerator};
pub use scrape::{SiteScraper, truncate_text};
