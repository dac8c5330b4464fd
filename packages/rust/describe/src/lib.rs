//! Commit message generation through a local Ollama server.
//!
//! The workflow hands over a non-empty diff and expects a short message back.
//! Any failure here aborts the run: a fabricated or missing message is never
//! committed.

mod clean;

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use gitscribe_shared::{
    ChangeSet, DescriberConfig, Description, DescriptionGenerator, GitScribeError, Result,
};

pub use clean::clean_message;

/// User-Agent string for Ollama requests.
const USER_AGENT: &str = concat!("gitscribe/", env!("CARGO_PKG_VERSION"));

/// Instruction placed in front of the diff.
const PROMPT_PREFIX: &str =
    "Generate a concise, descriptive git commit message for the following diff:\n\n";

// -- Ollama API request/response types --

/// Request body for Ollama's `/api/chat` endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    /// Disable streaming to get a single response object.
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Response from Ollama's `/api/chat` endpoint (non-streaming).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Build the single user prompt for a diff.
fn build_prompt(diff: &ChangeSet) -> String {
    format!("{PROMPT_PREFIX}{diff}")
}

// ---------------------------------------------------------------------------
// OllamaDescriber
// ---------------------------------------------------------------------------

/// [`DescriptionGenerator`] backed by Ollama's chat API.
pub struct OllamaDescriber {
    client: Client,
    endpoint: Url,
    model: String,
}

impl OllamaDescriber {
    /// Build the HTTP client once; the timeout covers the whole request.
    pub fn new(config: &DescriberConfig) -> Result<Self> {
        let mut base = Url::parse(&config.base_url).map_err(|e| {
            GitScribeError::config(format!("invalid Ollama base URL '{}': {e}", config.base_url))
        })?;
        // Keep any path prefix (reverse proxies) when joining the endpoint.
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        let endpoint = base.join("api/chat").map_err(|e| {
            GitScribeError::config(format!("cannot build chat endpoint from '{base}': {e}"))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                GitScribeError::Description(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl DescriptionGenerator for OllamaDescriber {
    #[instrument(skip_all, fields(diff_bytes = diff.as_str().len()))]
    async fn describe(&self, diff: &ChangeSet) -> Result<Description> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: build_prompt(diff),
            }],
            stream: false,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "sending chat request");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GitScribeError::Description(format!("{}: request timed out", self.endpoint))
                } else {
                    GitScribeError::Description(format!("{}: {e}", self.endpoint))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitScribeError::Description(format!(
                "{}: HTTP {status}: {}",
                self.endpoint,
                body.trim()
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            GitScribeError::Description(format!("invalid response from Ollama: {e}"))
        })?;

        let message = clean_message(&body.message.content);
        if message.is_empty() {
            return Err(GitScribeError::Description(
                "model returned an empty message".into(),
            ));
        }

        info!(
            model = body.model.as_deref().unwrap_or(&self.model),
            tokens_out = body.eval_count.unwrap_or(0),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generated commit message"
        );

        Ok(Description::new(message))
    }
}
