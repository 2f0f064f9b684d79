//! LRU memoisation for embedding oracles.
//!
//! Oracles are idempotent, so a text→vector mapping can be reused across
//! generations: elites and unchanged offspring reappear every generation and
//! would otherwise be re-embedded each time. Fitness records are still
//! recomputed from the cached vectors. Failed lookups are never cached.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Embedding, EmbeddingOracle};
use crate::error::{Error, Result};

// ============================================================================
// Cache Statistics
// ============================================================================

/// Snapshot of cache activity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups forwarded to the wrapped oracle.
    pub misses: u64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate as a percentage (0.0 - 100.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

// ============================================================================
// Cached Embedder
// ============================================================================

/// Wraps an oracle with an LRU cache keyed by the exact text.
#[derive(Debug)]
pub struct CachedEmbedder<O> {
    inner: O,
    entries: Mutex<LruCache<String, Embedding>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<O: EmbeddingOracle> CachedEmbedder<O> {
    /// Wrap `inner` with room for `capacity` vectors (at least one).
    pub fn new(inner: O, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: entries.len(),
            capacity: entries.cap().get(),
        }
    }

    /// Drop every cached vector. Statistics are kept.
    pub fn clear(&self) {
        self.entries().clear();
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Embedding>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, text: &str) -> Option<Embedding> {
        let hit = self.entries().get(text).cloned();
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("Embedding cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    fn store(&self, text: &str, vector: &Embedding) {
        self.entries().put(text.to_string(), vector.clone());
    }
}

#[async_trait]
impl<O: EmbeddingOracle> EmbeddingOracle for CachedEmbedder<O> {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        if let Some(vector) = self.lookup(text) {
            return Ok(vector);
        }

        let vector = self.inner.embed(text).await?;
        self.store(text, &vector);
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Result<Embedding>>> {
        let mut results: Vec<Option<Result<Embedding>>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();
        let mut missing_at = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.lookup(text) {
                Some(vector) => results.push(Some(Ok(vector))),
                None => {
                    results.push(None);
                    missing.push(text.clone());
                    missing_at.push(i);
                }
            }
        }

        if !missing.is_empty() {
            let fetched = self.inner.embed_batch(&missing).await?;
            for ((i, text), outcome) in missing_at.into_iter().zip(&missing).zip(fetched) {
                if let Ok(vector) = &outcome {
                    self.store(text, vector);
                }
                results[i] = Some(outcome);
            }
        }

        Ok(results
            .into_iter()
            .map(|r| {
                r.unwrap_or_else(|| {
                    Err(Error::embedding_unavailable(
                        "oracle returned fewer vectors than requested",
                    ))
                })
            })
            .collect())
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
