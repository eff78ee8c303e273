//! Interest-over-time provider boundary.
//!
//! The provider is a pure request-shaped capability: one call in, one table
//! (or error) out. All retry, backoff, and sequencing policy lives in the
//! fetcher, which keeps the batch state machine testable with a fake
//! provider.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use semscout_shared::{Result, SemScoutError};

/// Lookback window sent with every request.
pub const LOOKBACK_WINDOW: &str = "today 12-m";

/// Request timeout for a single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("SemScout/", env!("CARGO_PKG_VERSION"));

/// Per-keyword interest series returned by the provider.
///
/// A keyword requested but absent from `series` produced no data; an
/// entirely empty table is treated as a failed call by the fetcher.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterestTable {
    #[serde(default)]
    pub series: HashMap<String, Vec<f64>>,
}

/// Capability interface for the popularity-signal source.
pub trait TrendsProvider {
    /// Request the interest-over-time series for one batch of keywords in
    /// one geography, over the fixed lookback window.
    fn interest_over_time(
        &self,
        keywords: &[String],
        geo: &str,
    ) -> impl Future<Output = Result<InterestTable>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct InterestRequest<'a> {
    keywords: &'a [String],
    geo: &'a str,
    window: &'static str,
}

/// HTTP-backed provider posting JSON to `<endpoint>/interest_over_time`.
pub struct HttpTrendsProvider {
    client: Client,
    endpoint: String,
}

impl HttpTrendsProvider {
    /// Create a provider for the given endpoint base URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SemScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }
}

impl TrendsProvider for HttpTrendsProvider {
    async fn interest_over_time(&self, keywords: &[String], geo: &str) -> Result<InterestTable> {
        let url = format!("{}/interest_over_time", self.endpoint);
        let body = InterestRequest {
            keywords,
            geo,
            window: LOOKBACK_WINDOW,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SemScoutError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SemScoutError::Provider(format!("{url}: HTTP {status}")));
        }

        response
            .json::<InterestTable>()
            .await
            .map_err(|e| SemScoutError::parse(format!("{url}: invalid interest table: {e}")))
    }
}
