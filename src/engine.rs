//! # Evolution Engine
//!
//! Runs the generation loop that shortens a prompt while keeping it close to
//! the original in embedding space.
//!
//! ```text
//! Initialized -> Evaluating -> Recorded -> (Converged | Exhausted) -> Done
//!                    ^             |
//!                    +-------------+  next generation
//! ```
//!
//! Every call to [`EvolutionEngine::optimize`] owns its search context,
//! population and random number generator, so one engine can serve
//! concurrent calls.
//!
//! ## Example
//!
//! ```rust,ignore
//! let engine = EvolutionEngine::from_config(&Config::load()?)?;
//! let result = engine.optimize(prompt, 0.3, 0.85, None).await?;
//! println!("{}", result.summary());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{Config, ConfigOverrides, OptimizerConfig};
use crate::constants::EARLY_STOPPING_WINDOW;
use crate::embedding::{CachedEmbedder, EmbeddingOracle, OllamaEmbedder};
use crate::error::{Error, Result};
use crate::fitness::{FitnessEvaluator, FitnessRecord, SearchContext};
use crate::population::PopulationManager;
use crate::similarity::cosine_similarity;
use crate::token::estimate_tokens;
use crate::variation::VariationGenerator;

// =============================================================================
// ENGINE STATE
// =============================================================================

/// Phase of a single optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Configuration validated, original embedded, first population seeded.
    Initialized,
    /// Scoring the current population.
    Evaluating,
    /// Generation ranked and recorded.
    Recorded,
    /// Stopped after too many generations without improvement.
    Converged,
    /// Reached the generation limit.
    Exhausted,
    /// Result assembled.
    Done,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::Evaluating => "evaluating",
            Self::Recorded => "recorded",
            Self::Converged => "converged",
            Self::Exhausted => "exhausted",
            Self::Done => "done",
        };
        write!(f, "{}", name)
    }
}

impl EngineState {
    /// Whether the generation loop stops in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::Exhausted | Self::Done)
    }
}

// =============================================================================
// GENERATION SNAPSHOT
// =============================================================================

/// Summary of one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSnapshot {
    pub generation_index: usize,
    pub best_fitness: f64,
    pub avg_fitness: f64,
    pub best_token_count: usize,
    pub best_similarity: f64,
}

impl GenerationSnapshot {
    /// Summarize a generation ranked by descending fitness.
    pub fn from_ranked(generation_index: usize, ranked: &[FitnessRecord]) -> Self {
        let avg_fitness = if ranked.is_empty() {
            0.0
        } else {
            ranked.iter().map(|r| r.fitness).sum::<f64>() / ranked.len() as f64
        };

        let (best_fitness, best_token_count, best_similarity) = ranked
            .first()
            .map(|r| (r.fitness, r.token_count, r.similarity))
            .unwrap_or((0.0, 0, 0.0));

        Self {
            generation_index,
            best_fitness,
            avg_fitness,
            best_token_count,
            best_similarity,
        }
    }
}

// =============================================================================
// OPTIMIZATION RESULT
// =============================================================================

/// Outcome of [`EvolutionEngine::optimize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub original_prompt: String,
    pub optimized_prompt: String,
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    /// `100 * (original_tokens - optimized_tokens) / original_tokens`.
    pub token_reduction_percent: f64,
    /// Cosine similarity of the optimized prompt to the original.
    pub similarity_score: f64,
    /// Number of generations evaluated.
    pub generation_count: usize,
    pub processing_time_ms: u64,
    pub history: Vec<GenerationSnapshot>,
    /// Whether the run stopped early for lack of improvement.
    #[serde(default)]
    pub converged: bool,
}

impl OptimizationResult {
    /// Whether the original prompt was returned as-is.
    pub fn is_unchanged(&self) -> bool {
        self.optimized_prompt == self.original_prompt
    }

    /// Best fitness of every generation, in order.
    pub fn fitness_progression(&self) -> Vec<f64> {
        self.history.iter().map(|s| s.best_fitness).collect()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Optimization: {} -> {} tokens ({:.1}% reduction), similarity {:.3}, {} generations in {}ms{}{}",
            self.original_tokens,
            self.optimized_tokens,
            self.token_reduction_percent,
            self.similarity_score,
            self.generation_count,
            self.processing_time_ms,
            if self.converged { " [CONVERGED]" } else { "" },
            if self.is_unchanged() { " [UNCHANGED]" } else { "" }
        )
    }
}

// =============================================================================
// EVOLUTION ENGINE
// =============================================================================

/// Genetic search for shorter, semantically equivalent prompts.
#[derive(Clone)]
pub struct EvolutionEngine {
    oracle: Arc<dyn EmbeddingOracle>,
    config: OptimizerConfig,
}

impl fmt::Debug for EvolutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvolutionEngine")
            .field("oracle", &self.oracle.name())
            .field("config", &self.config)
            .finish()
    }
}

impl EvolutionEngine {
    /// Create an engine with the default configuration.
    pub fn new(oracle: Arc<dyn EmbeddingOracle>) -> Self {
        Self {
            oracle,
            config: OptimizerConfig::default(),
        }
    }

    /// Create an engine with a custom base configuration.
    pub fn with_config(oracle: Arc<dyn EmbeddingOracle>, config: OptimizerConfig) -> Self {
        Self { oracle, config }
    }

    /// Create a builder around `oracle`.
    pub fn builder(oracle: Arc<dyn EmbeddingOracle>) -> EvolutionEngineBuilder {
        EvolutionEngineBuilder::new(oracle)
    }

    /// Build an engine backed by an Ollama embedder, cached unless
    /// `cache_capacity` is zero.
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = OllamaEmbedder::from_config(&config.embedding)?;
        let oracle: Arc<dyn EmbeddingOracle> = match config.embedding.cache_capacity {
            0 => Arc::new(embedder),
            capacity => Arc::new(CachedEmbedder::new(embedder, capacity)),
        };
        Ok(Self::with_config(oracle, config.optimizer.clone()))
    }

    /// The base configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// The embedding oracle.
    pub fn oracle(&self) -> &Arc<dyn EmbeddingOracle> {
        &self.oracle
    }

    /// Search for a shorter rewrite of `prompt`.
    ///
    /// `target_reduction` caps the fraction of tokens a candidate may drop and
    /// `min_similarity` is the lowest acceptable cosine similarity; both
    /// replace the corresponding fields of the base configuration after
    /// `overrides` is applied.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigInvalidValue`] for an invalid effective configuration
    /// - [`Error::EmptyPrompt`] for a blank prompt
    /// - [`Error::OriginalEmbeddingFailed`] when the prompt cannot be embedded
    ///
    /// The first two are reported before the oracle is called.
    #[instrument(
        skip_all,
        fields(
            prompt_len = prompt.len(),
            target_reduction = target_reduction,
            min_similarity = min_similarity,
            oracle = self.oracle.name()
        )
    )]
    pub async fn optimize(
        &self,
        prompt: &str,
        target_reduction: f64,
        min_similarity: f64,
        overrides: Option<ConfigOverrides>,
    ) -> Result<OptimizationResult> {
        let start = Instant::now();

        let mut config = match overrides {
            Some(overrides) => overrides.apply_to(&self.config),
            None => self.config.clone(),
        };
        config.max_token_reduction = target_reduction;
        config.min_similarity = min_similarity;
        config.validate()?;

        if prompt.trim().is_empty() {
            return Err(Error::EmptyPrompt);
        }

        let oracle = self.oracle.as_ref();
        let context = SearchContext::establish(prompt, oracle).await?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let evaluator = FitnessEvaluator::new(oracle);
        let manager = PopulationManager::new(&config);
        let mut population = VariationGenerator::from_config(&config).initial_population(
            &context.original,
            config.population_size,
            &mut rng,
        );

        let mut state = EngineState::Initialized;
        debug!(
            original_tokens = context.original_tokens,
            population_size = config.population_size,
            max_generations = config.max_generations,
            elite_size = config.elite_size,
            state = %state,
            "Starting evolution"
        );

        let mut history: Vec<GenerationSnapshot> = Vec::new();
        let mut best: Option<FitnessRecord> = None;
        let mut stale_generations = 0usize;
        let mut generation_index = 0usize;

        while !state.is_terminal() {
            state = EngineState::Evaluating;
            trace!(generation = generation_index, state = %state, "Evaluating generation");
            let mut ranked = evaluator.evaluate(&population, &context, &config).await;

            // Stable: equal fitness keeps population order.
            ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

            let snapshot = GenerationSnapshot::from_ranked(generation_index, &ranked);
            let improved = match (&best, ranked.first()) {
                (None, Some(_)) => true,
                (Some(current), Some(top)) => top.fitness > current.fitness,
                (_, None) => false,
            };
            if improved {
                best = ranked.first().cloned();
                stale_generations = 0;
            } else {
                stale_generations += 1;
            }

            state = EngineState::Recorded;
            trace!(
                generation = generation_index,
                best_fitness = snapshot.best_fitness,
                avg_fitness = snapshot.avg_fitness,
                best_tokens = snapshot.best_token_count,
                state = %state,
                "Generation recorded"
            );
            history.push(snapshot);

            if stale_generations >= EARLY_STOPPING_WINDOW {
                state = EngineState::Converged;
            } else if generation_index + 1 >= config.max_generations {
                state = EngineState::Exhausted;
            } else {
                population = manager.next_generation(&ranked, &mut rng);
                if population.is_empty() {
                    state = EngineState::Exhausted;
                }
                generation_index += 1;
            }
        }

        let converged = state == EngineState::Converged;
        debug!(state = %state, generations = history.len(), "Evolution stopped");

        let (optimized_prompt, recorded_similarity) = match best {
            Some(record) => (record.genome, record.similarity),
            None => (context.original.clone(), 1.0),
        };
        let similarity_score = self
            .final_similarity(&context, &optimized_prompt, recorded_similarity)
            .await;
        let optimized_tokens = estimate_tokens(&optimized_prompt);
        let token_reduction_percent = if context.original_tokens == 0 {
            0.0
        } else {
            100.0 * (context.original_tokens as f64 - optimized_tokens as f64)
                / context.original_tokens as f64
        };

        let result = OptimizationResult {
            original_prompt: context.original.clone(),
            optimized_prompt,
            original_tokens: context.original_tokens,
            optimized_tokens,
            token_reduction_percent,
            similarity_score,
            generation_count: history.len(),
            processing_time_ms: start.elapsed().as_millis() as u64,
            history,
            converged,
        };

        state = EngineState::Done;
        info!(
            generations = result.generation_count,
            original_tokens = result.original_tokens,
            optimized_tokens = result.optimized_tokens,
            similarity = result.similarity_score,
            converged = result.converged,
            duration_ms = result.processing_time_ms,
            state = %state,
            "Evolution complete"
        );

        Ok(result)
    }

    async fn final_similarity(&self, context: &SearchContext, genome: &str, recorded: f64) -> f64 {
        if genome == context.original {
            return 1.0;
        }

        let measured = match self.oracle.embed(genome).await {
            Ok(embedding) => cosine_similarity(&context.embedding, &embedding),
            Err(e) => Err(e),
        };
        measured.unwrap_or_else(|e| {
            warn!(error = %e, "Could not re-embed best genome, keeping recorded similarity");
            recorded
        })
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for [`EvolutionEngine`].
pub struct EvolutionEngineBuilder {
    oracle: Arc<dyn EmbeddingOracle>,
    config: Option<OptimizerConfig>,
}

impl EvolutionEngineBuilder {
    pub fn new(oracle: Arc<dyn EmbeddingOracle>) -> Self {
        Self {
            oracle,
            config: None,
        }
    }

    /// Set the full base configuration.
    pub fn config(mut self, config: OptimizerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the population size.
    pub fn population_size(mut self, size: usize) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        config.population_size = size;
        self.config = Some(config);
        self
    }

    /// Set the generation limit.
    pub fn max_generations(mut self, generations: usize) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        config.max_generations = generations;
        self.config = Some(config);
        self
    }

    /// Set the mutation rate.
    pub fn mutation_rate(mut self, rate: f64) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        config.mutation_rate = rate;
        self.config = Some(config);
        self
    }

    /// Set the crossover rate.
    pub fn crossover_rate(mut self, rate: f64) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        config.crossover_rate = rate;
        self.config = Some(config);
        self
    }

    /// Set the number of elites carried between generations.
    pub fn elite_size(mut self, size: usize) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        config.elite_size = size;
        self.config = Some(config);
        self
    }

    /// Set the seed for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        config.seed = Some(seed);
        self.config = Some(config);
        self
    }

    /// Build the engine, validating the base configuration.
    pub fn build(self) -> Result<EvolutionEngine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(EvolutionEngine::with_config(self.oracle, config))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedding;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Letter-frequency embedding; identical texts embed identically.
    #[derive(Default)]
    struct LetterOracle {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingOracle for LetterOracle {
        async fn embed(&self, text: &str) -> Result<Embedding> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0f32; 26];
            for c in text.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                v[(c - b'a') as usize] += 1.0;
            }
            Ok(v)
        }

        fn name(&self) -> &str {
            "letters"
        }
    }

    const PROMPT: &str = "Please write a very short and clear summary of the following report.";

    fn engine() -> (Arc<LetterOracle>, EvolutionEngine) {
        let oracle = Arc::new(LetterOracle::default());
        let engine = EvolutionEngine::builder(oracle.clone())
            .population_size(12)
            .max_generations(8)
            .elite_size(2)
            .seed(5)
            .build()
            .unwrap();
        (oracle, engine)
    }

    #[test]
    fn test_state_display_and_terminal() {
        assert_eq!(EngineState::Exhausted.to_string(), "exhausted");
        assert!(EngineState::Converged.is_terminal());
        assert!(!EngineState::Evaluating.is_terminal());
    }

    #[test]
    fn test_snapshot_from_ranked() {
        let ranked = vec![
            FitnessRecord {
                genome: "a b".into(),
                fitness: 0.8,
                token_count: 1,
                similarity: 0.95,
            },
            FitnessRecord {
                genome: "a b c".into(),
                fitness: 0.4,
                token_count: 2,
                similarity: 0.9,
            },
        ];
        let snapshot = GenerationSnapshot::from_ranked(3, &ranked);
        assert_eq!(snapshot.generation_index, 3);
        assert!((snapshot.avg_fitness - 0.6).abs() < 1e-12);
        assert_eq!(snapshot.best_token_count, 1);
        assert_eq!(snapshot.best_similarity, 0.95);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let err = EvolutionEngine::builder(Arc::new(LetterOracle::default()))
            .elite_size(0)
            .build()
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_optimize_records_history() {
        let (_, engine) = engine();
        let result = engine.optimize(PROMPT, 0.5, 0.6, None).await.unwrap();

        assert!(result.generation_count >= 1 && result.generation_count <= 8);
        assert_eq!(result.history.len(), result.generation_count);
        assert_eq!(result.original_tokens, estimate_tokens(PROMPT));
        assert!(result.similarity_score >= 0.6);
        for (i, s) in result.history.iter().enumerate() {
            assert_eq!(s.generation_index, i);
        }
    }

    #[tokio::test]
    async fn test_invalid_target_rejected_before_oracle() {
        let (oracle, engine) = engine();
        let err = engine.optimize(PROMPT, 1.5, 0.8, None).await.unwrap_err();
        assert!(matches!(err, Error::ConfigInvalidValue { .. }));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_prompt_rejected_before_oracle() {
        let (oracle, engine) = engine();
        let err = engine.optimize("   \n", 0.3, 0.8, None).await.unwrap_err();
        assert!(matches!(err, Error::EmptyPrompt));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overrides_patch_base_config() {
        let (_, engine) = engine();
        let overrides = ConfigOverrides::new().max_generations(2).population_size(4).elite_size(1);
        let result = engine.optimize(PROMPT, 0.5, 0.6, Some(overrides)).await.unwrap();
        assert!(result.generation_count <= 2);
    }

    #[tokio::test]
    async fn test_single_word_prompt() {
        let (_, engine) = engine();
        let result = engine.optimize("Summarize.", 0.5, 0.99, None).await.unwrap();
        assert!(result.is_unchanged());
        assert_eq!(result.similarity_score, 1.0);
        assert_eq!(result.token_reduction_percent, 0.0);
    }

    #[test]
    fn test_result_reporting() {
        let result = OptimizationResult {
            original_prompt: "a b c d".into(),
            optimized_prompt: "a b".into(),
            original_tokens: 2,
            optimized_tokens: 1,
            token_reduction_percent: 50.0,
            similarity_score: 0.91,
            generation_count: 2,
            processing_time_ms: 12,
            history: vec![
                GenerationSnapshot {
                    generation_index: 0,
                    best_fitness: 0.7,
                    avg_fitness: 0.3,
                    best_token_count: 2,
                    best_similarity: 1.0,
                },
                GenerationSnapshot {
                    generation_index: 1,
                    best_fitness: 0.8,
                    avg_fitness: 0.5,
                    best_token_count: 1,
                    best_similarity: 0.91,
                },
            ],
            converged: false,
        };

        assert!(!result.is_unchanged());
        assert_eq!(result.fitness_progression(), vec![0.7, 0.8]);
        assert!(result.summary().contains("50.0% reduction"));

        let json = result.to_json().unwrap();
        let back: OptimizationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
