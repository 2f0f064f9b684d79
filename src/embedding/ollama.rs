//! # Ollama Embedding Client
//!
//! Talks to an Ollama-compatible `/api/embed` route. A single request carries
//! either one text or a whole population:
//!
//! ```text
//! POST /api/embed  {"model": "nomic-embed-text", "input": ["a", "b"]}
//!   -> {"embeddings": [[0.1, ...], [0.3, ...]]}
//! ```
//!
//! Transient failures are retried through [`RetryPolicy`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedding, EmbeddingOracle};
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use crate::recovery::RetryPolicy;

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
enum EmbedInput<'a> {
    One(&'a str),
    Many(&'a [String]),
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: EmbedInput<'a>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Embedding>,
}

// ============================================================================
// CLIENT
// ============================================================================

/// Embedding oracle backed by an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    endpoint: String,
    model: String,
    timeout_secs: u64,
    retry: RetryPolicy,
    http_client: Client,
}

impl OllamaEmbedder {
    /// Create a new builder with default settings.
    pub fn builder() -> OllamaEmbedderBuilder {
        OllamaEmbedderBuilder::new()
    }

    /// Create a client from the `embedding` section of the configuration.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::builder()
            .endpoint(&config.endpoint)
            .model(&config.model)
            .timeout_secs(config.timeout_secs)
            .max_retries(config.max_retries)
            .build()
    }

    /// Base URL of the server.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Embedding model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request_once(&self, input: EmbedInput<'_>) -> Result<Vec<Embedding>> {
        let url = format!("{}/api/embed", self.endpoint);
        let request = EmbedRequest {
            model: &self.model,
            input,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::api_timeout(self.timeout_secs)
                } else {
                    Error::api_connection_failed_with_source(&self.endpoint, e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api_response(status, body));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("Failed to parse embed response: {}", e)))?;

        Ok(parsed.embeddings)
    }

    async fn request(&self, input: EmbedInput<'_>) -> Result<Vec<Embedding>> {
        self.retry
            .run("ollama_embed", move || self.request_once(input))
            .await
    }
}

#[async_trait]
impl EmbeddingOracle for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut vectors = self.request(EmbedInput::One(text)).await?;
        match vectors.pop() {
            Some(v) if vectors.is_empty() && !v.is_empty() => Ok(v),
            _ => Err(Error::embedding_unavailable(format!(
                "model '{}' returned no usable vector",
                self.model
            ))),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Result<Embedding>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.request(EmbedInput::Many(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(Error::embedding_unavailable(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        debug!(count = vectors.len(), model = %self.model, "Batch embedded");

        Ok(vectors
            .into_iter()
            .map(|v| {
                if v.is_empty() {
                    Err(Error::embedding_unavailable("empty vector in batch"))
                } else {
                    Ok(v)
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builder for [`OllamaEmbedder`].
///
/// # Example
///
/// ```rust,ignore
/// let embedder = OllamaEmbedder::builder()
///     .endpoint("http://localhost:11434")
///     .model("nomic-embed-text")
///     .timeout_secs(10)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct OllamaEmbedderBuilder {
    config: EmbeddingConfig,
    retry: Option<RetryPolicy>,
}

impl Default for OllamaEmbedderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaEmbedderBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: EmbeddingConfig::default(),
            retry: None,
        }
    }

    /// Set the server base URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the embedding model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the per-request timeout in seconds.
    pub fn timeout_secs(mut self, timeout: u64) -> Self {
        self.config.timeout_secs = timeout;
        self
    }

    /// Set the number of retries on transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Replace the retry policy entirely.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<OllamaEmbedder> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(OllamaEmbedder {
            endpoint: self.config.endpoint.trim_end_matches('/').to_string(),
            model: self.config.model,
            timeout_secs: self.config.timeout_secs,
            retry: self
                .retry
                .unwrap_or_else(|| RetryPolicy::new(self.config.max_retries)),
            http_client,
        })
    }
}
