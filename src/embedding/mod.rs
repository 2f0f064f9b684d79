//! # Embedding Oracles
//!
//! The optimizer judges meaning through an external embedding function.
//! This module defines the [`EmbeddingOracle`] trait it consumes and ships
//! two adapters:
//!
//! - [`OllamaEmbedder`]: HTTP client for an Ollama-compatible `/api/embed` route
//! - [`CachedEmbedder`]: LRU memoisation around any other oracle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use prompt_evolver::embedding::{CachedEmbedder, EmbeddingOracle, OllamaEmbedder};
//!
//! let oracle = CachedEmbedder::new(OllamaEmbedder::builder().model("nomic-embed-text").build()?, 4096);
//! let vector = oracle.embed("Summarize this article.").await?;
//! ```

pub mod cache;
pub mod ollama;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::error::Result;

pub use cache::{CacheStats, CachedEmbedder};
pub use ollama::{OllamaEmbedder, OllamaEmbedderBuilder};

/// A fixed-length vector produced by an embedding model.
pub type Embedding = Vec<f32>;

/// Maps text to a fixed-length vector.
///
/// Implementations must be idempotent for a given text and must tolerate
/// concurrent calls. Failures are reported per call and are survivable.
#[async_trait]
pub trait EmbeddingOracle: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Embed many texts, returning one result per input in input order.
    ///
    /// The outer `Err` means the whole batch failed and callers should fall
    /// back to [`EmbeddingOracle::embed`]. The default issues every `embed`
    /// call concurrently.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Result<Embedding>>> {
        Ok(join_all(texts.iter().map(|t| self.embed(t))).await)
    }

    /// Short identifier used in log lines.
    fn name(&self) -> &str {
        "oracle"
    }
}

#[async_trait]
impl<T: EmbeddingOracle + ?Sized> EmbeddingOracle for Arc<T> {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        (**self).embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Result<Embedding>>> {
        (**self).embed_batch(texts).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: EmbeddingOracle + ?Sized> EmbeddingOracle for Box<T> {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        (**self).embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Result<Embedding>>> {
        (**self).embed_batch(texts).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
