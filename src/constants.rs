//! Centralized constants for prompt-evolver.
//!
//! Single source of truth for the magic numbers and default values used
//! throughout the crate.

// ============================================================================
// Token Estimation
// ============================================================================

/// Average number of UTF-8 bytes per token assumed by the estimator.
pub const CHARS_PER_TOKEN: usize = 4;

// ============================================================================
// Search Policy
// ============================================================================

/// Number of members sampled per tournament during parent selection.
pub const TOURNAMENT_SIZE: usize = 3;

/// Consecutive generations without a strict best-fitness improvement
/// after which the search stops.
pub const EARLY_STOPPING_WINDOW: usize = 20;

// ============================================================================
// Optimizer Defaults
// ============================================================================

/// Default number of genomes per generation.
pub const DEFAULT_POPULATION_SIZE: usize = 50;

/// Default generation cap.
pub const DEFAULT_MAX_GENERATIONS: usize = 100;

/// Default probability of applying a point mutation to a child.
pub const DEFAULT_MUTATION_RATE: f64 = 0.1;

/// Default probability of producing a child by crossover.
pub const DEFAULT_CROSSOVER_RATE: f64 = 0.7;

/// Default number of genomes carried unchanged into the next generation.
pub const DEFAULT_ELITE_SIZE: usize = 5;

/// Default weight of semantic similarity in the fitness score.
pub const DEFAULT_SIMILARITY_WEIGHT: f64 = 0.7;

/// Default weight of token reduction in the fitness score.
pub const DEFAULT_TOKEN_WEIGHT: f64 = 0.3;

/// Default minimum cosine similarity a candidate must keep.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.85;

/// Default upper bound on the fraction of tokens a candidate may remove.
pub const DEFAULT_MAX_TOKEN_REDUCTION: f64 = 0.5;

// ============================================================================
// Embedding Endpoint Defaults
// ============================================================================

/// Default Ollama-compatible embedding endpoint.
pub const DEFAULT_EMBEDDING_ENDPOINT: &str = "http://localhost:11434";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Default timeout for embedding requests in seconds.
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;

/// Default maximum retry attempts for failed embedding requests.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default number of text→vector entries kept by the embedding cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Base delay for retry backoff in milliseconds.
pub const RETRY_BASE_DELAY_MS: u64 = 250;

/// Maximum delay for retry backoff in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 8_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((DEFAULT_SIMILARITY_WEIGHT + DEFAULT_TOKEN_WEIGHT - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_thresholds_in_range() {
        assert!((0.0..=1.0).contains(&DEFAULT_MUTATION_RATE));
        assert!((0.0..=1.0).contains(&DEFAULT_CROSSOVER_RATE));
        assert!((0.0..=1.0).contains(&DEFAULT_MIN_SIMILARITY));
        assert!((0.0..=1.0).contains(&DEFAULT_MAX_TOKEN_REDUCTION));
    }

    #[test]
    fn test_elite_fits_in_population() {
        assert!(DEFAULT_ELITE_SIZE > 0);
        assert!(DEFAULT_ELITE_SIZE <= DEFAULT_POPULATION_SIZE);
        assert!(RETRY_BASE_DELAY_MS <= RETRY_MAX_DELAY_MS);
    }
}
