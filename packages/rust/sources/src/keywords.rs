//! Seed-keyword extraction and expansion via a text-generation service.
//!
//! Both operations ask the model for a bulleted list and parse it back.
//! Generation failure is never fatal here: extraction degrades to an empty
//! list and expansion to the unchanged seed set, logged for the operator.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use semscout_shared::dedup_keywords;

use crate::llm::TextGenerator;

/// Matches a `- keyword` or `* keyword` bullet line.
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*]\s+(.+?)\s*$").unwrap());

/// Extract up to `max_keywords` seed keywords from website text.
///
/// Returns an empty list if generation fails or produces no bullets; the
/// caller decides what to fall back to.
pub async fn extract_seeds<G: TextGenerator>(
    generator: &G,
    text: &str,
    max_keywords: usize,
) -> Vec<String> {
    let prompt = format!(
        "Extract the top seed keywords for search-advertising campaigns \
         from the following website text:\n{text}\n\n\
         List them as a bulleted list."
    );

    let response = match generator.generate(&prompt).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "seed extraction failed, continuing without extracted seeds");
            return Vec::new();
        }
    };

    let mut seeds = dedup_keywords(parse_bullets(&response));
    seeds.truncate(max_keywords);

    info!(seeds = seeds.len(), "extracted seed keywords");
    seeds
}

/// Expand seed keywords into a larger set of related terms.
///
/// The result is the seeds plus up to `max_factor × seeds.len()` generated
/// terms, de-duplicated, seeds first. On generation failure the seed set is
/// returned unchanged.
pub async fn expand<G: TextGenerator>(
    generator: &G,
    seeds: &[String],
    max_factor: usize,
) -> Vec<String> {
    if seeds.is_empty() {
        return Vec::new();
    }

    let seed_list = seeds
        .iter()
        .map(|kw| format!("- {kw}"))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "Given the following seed keywords, generate a list of related \
         keyword phrases for search-advertising campaigns.\n\
         Seed keywords:\n{seed_list}\n\
         Return only the expanded keywords as a bulleted list."
    );

    let response = match generator.generate(&prompt).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "keyword expansion failed, keeping seed set unchanged");
            return seeds.to_vec();
        }
    };

    let cap = max_factor * seeds.len();
    let mut generated: Vec<String> = Vec::new();
    for kw in parse_bullets(&response) {
        if generated.len() >= cap {
            break;
        }
        if seeds.contains(&kw) || generated.contains(&kw) {
            continue;
        }
        generated.push(kw);
    }

    let expanded = dedup_keywords(seeds.iter().cloned().chain(generated));

    info!(
        seeds = seeds.len(),
        expanded = expanded.len(),
        "expanded keyword set"
    );
    expanded
}

/// Pull the payload out of every bullet line in a completion.
fn parse_bullets(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| BULLET_RE.captures(line).map(|c| c[1].to_string()))
        .collect()
}
