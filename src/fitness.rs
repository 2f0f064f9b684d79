//! Fitness evaluation against the original prompt.
//!
//! A genome scores `similarity_weight * similarity + token_weight *
//! (reduction / max_token_reduction)`, or zero when it drifts below
//! `min_similarity`, removes more than `max_token_reduction` of the tokens,
//! or could not be embedded. Records are recomputed for every generation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::OptimizerConfig;
use crate::embedding::{Embedding, EmbeddingOracle};
use crate::error::{Error, Result};
use crate::similarity::cosine_similarity;
use crate::token::{estimate_tokens, token_reduction};
use crate::{Genome, Score};

// =============================================================================
// SEARCH CONTEXT
// =============================================================================

/// The original prompt and its baseline measurements for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchContext {
    /// The prompt being optimized.
    pub original: String,
    /// Embedding of the original prompt.
    pub embedding: Embedding,
    /// Estimated token count of the original prompt.
    pub original_tokens: usize,
}

impl SearchContext {
    /// Build a context from an already computed embedding.
    pub fn new(original: impl Into<String>, embedding: Embedding) -> Self {
        let original = original.into();
        let original_tokens = estimate_tokens(&original);
        Self {
            original,
            embedding,
            original_tokens,
        }
    }

    /// Embed the original prompt once.
    ///
    /// # Errors
    ///
    /// [`Error::OriginalEmbeddingFailed`] when the oracle fails or returns an
    /// empty vector.
    pub async fn establish(prompt: &str, oracle: &dyn EmbeddingOracle) -> Result<Self> {
        let embedding = oracle
            .embed(prompt)
            .await
            .map_err(Error::original_embedding_failed)?;

        if embedding.is_empty() {
            return Err(Error::original_embedding_failed(Error::embedding_unavailable(
                "oracle returned an empty vector",
            )));
        }

        Ok(Self::new(prompt, embedding))
    }
}

// =============================================================================
// FITNESS RECORD
// =============================================================================

/// Score of one genome in one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessRecord {
    pub genome: Genome,
    pub fitness: Score,
    pub token_count: usize,
    pub similarity: f64,
}

/// Combine similarity and length into a fitness score.
pub fn compute_fitness(
    similarity: f64,
    token_count: usize,
    original_tokens: usize,
    config: &OptimizerConfig,
) -> Score {
    let reduction = token_reduction(original_tokens, token_count);
    if similarity < config.min_similarity || reduction > config.max_token_reduction {
        return 0.0;
    }

    let token_term = if config.max_token_reduction > 0.0 {
        reduction / config.max_token_reduction
    } else {
        0.0
    };

    (config.similarity_weight * similarity + config.token_weight * token_term).max(0.0)
}

// =============================================================================
// FITNESS EVALUATOR
// =============================================================================

/// Scores populations using an embedding oracle.
pub struct FitnessEvaluator<'a> {
    oracle: &'a dyn EmbeddingOracle,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(oracle: &'a dyn EmbeddingOracle) -> Self {
        Self { oracle }
    }

    /// Score every genome, in input order.
    ///
    /// Embeddings are requested as one batch; a failed batch falls back to
    /// one request per genome. A genome without a usable embedding scores
    /// zero and never aborts the generation.
    pub async fn evaluate(
        &self,
        population: &[Genome],
        context: &SearchContext,
        config: &OptimizerConfig,
    ) -> Vec<FitnessRecord> {
        let embeddings = self.embed_population(population).await;
        let mut failures = 0usize;

        let records: Vec<FitnessRecord> = population
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (genome, embedding))| {
                let token_count = estimate_tokens(genome);
                let similarity = embedding
                    .and_then(|v| cosine_similarity(&context.embedding, &v));

                match similarity {
                    Ok(similarity) => FitnessRecord {
                        genome: genome.clone(),
                        fitness: compute_fitness(
                            similarity,
                            token_count,
                            context.original_tokens,
                            config,
                        ),
                        token_count,
                        similarity,
                    },
                    Err(e) => {
                        failures += 1;
                        warn!(
                            genome_index = index,
                            error = %e,
                            "Embedding unavailable, scoring genome as zero"
                        );
                        FitnessRecord {
                            genome: genome.clone(),
                            fitness: 0.0,
                            token_count,
                            similarity: 0.0,
                        }
                    }
                }
            })
            .collect();

        debug!(
            population = population.len(),
            failures = failures,
            oracle = self.oracle.name(),
            "Population evaluated"
        );

        records
    }

    async fn embed_population(&self, population: &[Genome]) -> Vec<Result<Embedding>> {
        match self.oracle.embed_batch(population).await {
            Ok(results) if results.len() == population.len() => return results,
            Ok(results) => warn!(
                expected = population.len(),
                received = results.len(),
                "Batch embedding returned the wrong count, falling back to single requests"
            ),
            Err(e) => warn!(
                error = %e,
                "Batch embedding failed, falling back to single requests"
            ),
        }

        let mut results = Vec::with_capacity(population.len());
        for genome in population {
            results.push(self.oracle.embed(genome).await);
        }
        results
    }
}
