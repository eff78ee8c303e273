//! Website text scraping for seed-keyword derivation.
//!
//! Only the parts of a page that describe what the site is about are
//! collected: the title, the meta description, and the H1/H2 headings.
//! Body copy is noise for keyword extraction and stays out.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use semscout_shared::{Result, SemScoutError};

/// Request timeout for a single page fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent string for scrape requests.
const USER_AGENT: &str = concat!("SemScout/", env!("CARGO_PKG_VERSION"));

/// Fetches pages and extracts their descriptive text.
pub struct SiteScraper {
    client: Client,
}

impl SiteScraper {
    /// Create a scraper with its own HTTP client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SemScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch `url` and return its title, meta description, and headings,
    /// one per line.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn page_text(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| SemScoutError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SemScoutError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SemScoutError::Network(format!("{url}: body read failed: {e}")))?;

        let text = extract_page_text(&body);
        debug!(chars = text.len(), "extracted page text");
        Ok(text)
    }
}

/// Pull title, meta description, and H1/H2 text out of an HTML document.
fn extract_page_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut texts: Vec<String> = Vec::new();

    let title_sel = Selector::parse("title").unwrap();
    if let Some(el) = doc.select(&title_sel).next() {
        push_text(&mut texts, el.text().collect::<String>());
    }

    let desc_sel = Selector::parse(r#"meta[name="description"]"#).unwrap();
    if let Some(el) = doc.select(&desc_sel).next() {
        if let Some(content) = el.value().attr("content") {
            push_text(&mut texts, content.to_string());
        }
    }

    for tag in ["h1", "h2"] {
        let sel = Selector::parse(tag).unwrap();
        for el in doc.select(&sel) {
            push_text(&mut texts, el.text().collect::<String>());
        }
    }

    texts.join("\n")
}

fn push_text(texts: &mut Vec<String>, raw: String) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        texts.push(trimmed.to_string());
    }
}

/// Cap `text` at `max_chars` characters, respecting char boundaries.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
