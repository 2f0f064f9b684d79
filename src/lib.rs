//! # Prompt Evolver
//!
//! Evolutionary prompt compression: find a shorter rewrite of a prompt that
//! still means approximately the same thing.
//!
//! ## Overview
//!
//! A genetic search runs over candidate rewrites ("genomes"). Each genome is
//! scored by combining:
//!
//! - **Similarity**: cosine similarity between its embedding and the
//!   original's, as judged by an external [`EmbeddingOracle`]
//! - **Reduction**: the fraction of estimated tokens it removes
//!
//! Candidates below `min_similarity`, or removing more than the target
//! reduction, score zero.
//!
//! ## Architecture
//!
//! ```text
//!   prompt
//!     |
//!     v
//! +--------------------+     +-------------------+
//! |  EvolutionEngine   |---->|  EmbeddingOracle  |  (Ollama, cached, or yours)
//! +--------------------+     +-------------------+
//!     |          ^                    ^
//!     v          |                    |
//! +-----------+  |        +--------------------+
//! | Variation |  +--------|  FitnessEvaluator  |
//! +-----------+           +--------------------+
//!     |                           ^
//!     v                           |
//! +---------------------+         |
//! |  PopulationManager  |---------+
//! +---------------------+
//!     |
//!     v
//!  OptimizationResult
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use prompt_evolver::{Config, EvolutionEngine};
//!
//! #[tokio::main]
//! async fn main() -> prompt_evolver::Result<()> {
//!     prompt_evolver::tracing_setup::setup_logging(false, "info")?;
//!
//!     let engine = EvolutionEngine::from_config(&Config::load()?)?;
//!     let result = engine
//!         .optimize("Please provide a very detailed summary.", 0.3, 0.85, None)
//!         .await?;
//!
//!     println!("{}", result.optimized_prompt);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod constants;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod fitness;
pub mod population;
pub mod recovery;
pub mod similarity;
pub mod token;
pub mod tracing_setup;
pub mod variation;

// ============================================================================
// Type Aliases
// ============================================================================

/// A candidate rewrite of the prompt.
pub type Genome = String;

/// Type alias for fitness scores.
pub type Score = f64;

// Re-exports for convenient access
pub use config::{Config, ConfigOverrides, EmbeddingConfig, OptimizerConfig};
pub use constants::*;
pub use embedding::{
    CacheStats, CachedEmbedder, Embedding, EmbeddingOracle, OllamaEmbedder, OllamaEmbedderBuilder,
};
pub use engine::{
    EngineState, EvolutionEngine, EvolutionEngineBuilder, GenerationSnapshot, OptimizationResult,
};
pub use error::{Error, Result};
pub use fitness::{compute_fitness, FitnessEvaluator, FitnessRecord, SearchContext};
pub use population::{tournament_select, PopulationManager};
pub use recovery::{is_retryable_error, with_timeout, RetryPolicy};
pub use similarity::cosine_similarity;
pub use token::{estimate_tokens, token_reduction};
pub use variation::{MutationType, Strategy, VariationGenerator};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
