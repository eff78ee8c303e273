//! Text-generation service boundary.
//!
//! Keyword extraction and expansion go through the [`TextGenerator`]
//! capability so the pipeline can run against a fake in tests. The shipped
//! implementation talks to an OpenRouter-compatible chat-completions API.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use semscout_shared::{Result, SemScoutError};

/// Request timeout for a single generation call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("SemScout/", env!("CARGO_PKG_VERSION"));

/// Capability interface for a prompt-in/text-out generation service.
pub trait TextGenerator {
    /// Generate a completion for `prompt`.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Chat-completions wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

// ---------------------------------------------------------------------------
// OpenRouter client
// ---------------------------------------------------------------------------

/// Chat-completions client for OpenRouter-compatible APIs.
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    /// Create a client for `base_url` using `model` for every request.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SemScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

impl TextGenerator for OpenRouterClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SemScoutError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SemScoutError::Provider(format!("{url}: HTTP {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SemScoutError::parse(format!("{url}: invalid completion: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SemScoutError::Provider(format!("{url}: no choices in response")))?;

        debug!(chars = content.len(), "received completion");
        Ok(content)
    }
}
