//! Configuration management for prompt-evolver.
//!
//! [`Config`] groups the search parameters ([`OptimizerConfig`]) and the
//! embedding client settings ([`EmbeddingConfig`]). It can be loaded from a
//! YAML file or built from defaults; every field is optional in the file.
//!
//! # Default Configuration Location
//!
//! - Unix: `~/.config/prompt-evolver/config.yaml`
//! - Windows: `%APPDATA%/prompt-evolver/config.yaml`
//!
//! # Example Configuration File
//!
//! ```yaml
//! optimizer:
//!   population_size: 50
//!   max_generations: 100
//!   mutation_rate: 0.1
//!   crossover_rate: 0.7
//!   elite_size: 5
//!   similarity_weight: 0.7
//!   token_weight: 0.3
//!   min_similarity: 0.85
//!   max_token_reduction: 0.5
//!   seed: 42
//! embedding:
//!   endpoint: http://localhost:11434
//!   model: nomic-embed-text
//!   timeout_secs: 30
//!   max_retries: 3
//!   cache_capacity: 4096
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{bail_if, Error, Result};

// =============================================================================
// OPTIMIZER CONFIG
// =============================================================================

/// Parameters of one evolutionary search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Number of genomes per generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,

    /// Generation cap.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,

    /// Probability of a point mutation per child (0.0 - 1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,

    /// Probability of crossover per child (0.0 - 1.0).
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,

    /// Genomes carried unchanged into the next generation.
    #[serde(default = "default_elite_size")]
    pub elite_size: usize,

    /// Weight of semantic similarity in the fitness score.
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f64,

    /// Weight of token reduction in the fitness score.
    #[serde(default = "default_token_weight")]
    pub token_weight: f64,

    /// Candidates below this cosine similarity score zero.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    /// Candidates removing more than this fraction of tokens score zero.
    #[serde(default = "default_max_token_reduction")]
    pub max_token_reduction: f64,

    /// Seed for a reproducible search.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_population_size() -> usize {
    DEFAULT_POPULATION_SIZE
}

fn default_max_generations() -> usize {
    DEFAULT_MAX_GENERATIONS
}

fn default_mutation_rate() -> f64 {
    DEFAULT_MUTATION_RATE
}

fn default_crossover_rate() -> f64 {
    DEFAULT_CROSSOVER_RATE
}

fn default_elite_size() -> usize {
    DEFAULT_ELITE_SIZE
}

fn default_similarity_weight() -> f64 {
    DEFAULT_SIMILARITY_WEIGHT
}

fn default_token_weight() -> f64 {
    DEFAULT_TOKEN_WEIGHT
}

fn default_min_similarity() -> f64 {
    DEFAULT_MIN_SIMILARITY
}

fn default_max_token_reduction() -> f64 {
    DEFAULT_MAX_TOKEN_REDUCTION
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            max_generations: default_max_generations(),
            mutation_rate: default_mutation_rate(),
            crossover_rate: default_crossover_rate(),
            elite_size: default_elite_size(),
            similarity_weight: default_similarity_weight(),
            token_weight: default_token_weight(),
            min_similarity: default_min_similarity(),
            max_token_reduction: default_max_token_reduction(),
            seed: None,
        }
    }
}

impl OptimizerConfig {
    /// Small population and few generations, for interactive use.
    pub fn fast() -> Self {
        Self {
            population_size: 20,
            max_generations: 30,
            mutation_rate: 0.15,
            elite_size: 2,
            ..Self::default()
        }
    }

    /// Large population and long search.
    pub fn thorough() -> Self {
        Self {
            population_size: 100,
            max_generations: 250,
            mutation_rate: 0.08,
            crossover_rate: 0.8,
            elite_size: 10,
            ..Self::default()
        }
    }

    /// Set a seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every invariant. Called before any oracle work.
    pub fn validate(&self) -> Result<()> {
        bail_if!(
            self.population_size == 0,
            Error::config_invalid_value("population_size", "must be greater than 0")
        );
        bail_if!(
            self.max_generations == 0,
            Error::config_invalid_value("max_generations", "must be greater than 0")
        );
        bail_if!(
            self.elite_size == 0,
            Error::config_invalid_value("elite_size", "must be greater than 0")
        );
        bail_if!(
            self.elite_size > self.population_size,
            Error::config_invalid_value(
                "elite_size",
                format!(
                    "{} exceeds population_size {}",
                    self.elite_size, self.population_size
                )
            )
        );

        for (key, value) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
            ("min_similarity", self.min_similarity),
            ("max_token_reduction", self.max_token_reduction),
        ] {
            bail_if!(
                !(0.0..=1.0).contains(&value),
                Error::config_invalid_value(key, format!("{} is outside [0, 1]", value))
            );
        }

        for (key, value) in [
            ("similarity_weight", self.similarity_weight),
            ("token_weight", self.token_weight),
        ] {
            bail_if!(
                !value.is_finite() || value < 0.0,
                Error::config_invalid_value(key, format!("{} must be a non-negative number", value))
            );
        }

        Ok(())
    }
}

// =============================================================================
// OVERRIDES
// =============================================================================

/// Partial patch over an [`OptimizerConfig`]. Unset fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_generations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossover_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elite_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ConfigOverrides {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    pub fn max_generations(mut self, generations: usize) -> Self {
        self.max_generations = Some(generations);
        self
    }

    pub fn mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = Some(rate);
        self
    }

    pub fn crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = Some(rate);
        self
    }

    pub fn elite_size(mut self, size: usize) -> Self {
        self.elite_size = Some(size);
        self
    }

    pub fn similarity_weight(mut self, weight: f64) -> Self {
        self.similarity_weight = Some(weight);
        self
    }

    pub fn token_weight(mut self, weight: f64) -> Self {
        self.token_weight = Some(weight);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Return `base` with every set field replaced.
    pub fn apply_to(&self, base: &OptimizerConfig) -> OptimizerConfig {
        OptimizerConfig {
            population_size: self.population_size.unwrap_or(base.population_size),
            max_generations: self.max_generations.unwrap_or(base.max_generations),
            mutation_rate: self.mutation_rate.unwrap_or(base.mutation_rate),
            crossover_rate: self.crossover_rate.unwrap_or(base.crossover_rate),
            elite_size: self.elite_size.unwrap_or(base.elite_size),
            similarity_weight: self.similarity_weight.unwrap_or(base.similarity_weight),
            token_weight: self.token_weight.unwrap_or(base.token_weight),
            min_similarity: base.min_similarity,
            max_token_reduction: base.max_token_reduction,
            seed: self.seed.or(base.seed),
        }
    }
}

// =============================================================================
// EMBEDDING CONFIG
// =============================================================================

/// Settings for the HTTP embedding client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the Ollama-compatible server.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Embedding model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Number of text→vector entries kept in memory. Zero disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_endpoint() -> String {
    DEFAULT_EMBEDDING_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_EMBEDDING_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

// =============================================================================
// CONFIG STRUCT
// =============================================================================

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl Config {
    /// Load from [`Config::config_path()`], or return defaults when that file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or holds
    /// invalid optimizer values.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from a specific YAML file and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::config_file_not_found(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| Error::config_invalid_format(path.display().to_string(), e.to_string()))?;
        config.optimizer.validate()?;
        Ok(config)
    }

    /// Save as YAML, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default configuration file path.
    ///
    /// Falls back to `./prompt-evolver-config.yaml` when no config directory
    /// can be determined.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("prompt-evolver").join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("./prompt-evolver-config.yaml"))
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // ---- OptimizerConfig Tests ----

    #[test]
    fn test_default_optimizer_config() {
        let config = OptimizerConfig::default();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.max_generations, 100);
        assert_eq!(config.elite_size, 5);
        assert!((config.similarity_weight - 0.7).abs() < f64::EPSILON);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(OptimizerConfig::fast().validate().is_ok());
        assert!(OptimizerConfig::thorough().validate().is_ok());
        assert!(
            OptimizerConfig::fast().population_size < OptimizerConfig::thorough().population_size
        );
        assert_eq!(OptimizerConfig::fast().with_seed(9).seed, Some(9));
    }

    #[test]
    fn test_validate_elite_bounds() {
        let mut config = OptimizerConfig::default();
        config.elite_size = config.population_size + 1;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigInvalidValue { ref key, .. } if key == "elite_size"));

        config.elite_size = 0;
        assert!(config.validate().is_err());

        config.elite_size = config.population_size;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ranges() {
        let defaults = OptimizerConfig::default;
        let cases = vec![
            OptimizerConfig { mutation_rate: 1.5, ..defaults() },
            OptimizerConfig { crossover_rate: -0.1, ..defaults() },
            OptimizerConfig { min_similarity: 1.01, ..defaults() },
            OptimizerConfig { max_token_reduction: -0.5, ..defaults() },
            OptimizerConfig { max_generations: 0, ..defaults() },
            OptimizerConfig { token_weight: f64::NAN, ..defaults() },
            OptimizerConfig { similarity_weight: -1.0, ..defaults() },
        ];
        for config in cases {
            assert!(config.validate().unwrap_err().is_config_error());
        }
    }

    #[test]
    fn test_validate_accepts_boundaries() {
        let config = OptimizerConfig {
            mutation_rate: 0.0,
            crossover_rate: 1.0,
            min_similarity: 0.0,
            max_token_reduction: 0.0,
            ..OptimizerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    // ---- ConfigOverrides Tests ----

    #[test]
    fn test_overrides_patch_only_set_fields() {
        let base = OptimizerConfig::default().with_seed(1);
        let patched = ConfigOverrides::new()
            .population_size(12)
            .elite_size(3)
            .apply_to(&base);

        assert_eq!(patched.population_size, 12);
        assert_eq!(patched.elite_size, 3);
        assert_eq!(patched.max_generations, base.max_generations);
        assert_eq!(patched.seed, Some(1));
    }

    #[test]
    fn test_empty_overrides_are_identity() {
        let base = OptimizerConfig::thorough();
        assert!(ConfigOverrides::default().is_empty());
        assert_eq!(ConfigOverrides::default().apply_to(&base), base);
        assert!(!ConfigOverrides::new().seed(3).is_empty());
    }

    // ---- File Tests ----

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
optimizer:
  population_size: 30
embedding:
  model: mxbai-embed-large
"#;
        let config: Config = serde_yaml::from_str(yaml).expect("Should deserialize");

        assert_eq!(config.optimizer.population_size, 30);
        assert_eq!(config.optimizer.elite_size, DEFAULT_ELITE_SIZE);
        assert_eq!(config.embedding.model, "mxbai-embed-large");
        assert_eq!(config.embedding.endpoint, DEFAULT_EMBEDDING_ENDPOINT);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().expect("Should create temp file");
        let yaml = r#"
optimizer:
  max_generations: 40
  seed: 7
embedding:
  timeout_secs: 5
"#;
        temp_file.write_all(yaml.as_bytes()).expect("Should write");

        let config = Config::load_from_file(temp_file.path()).expect("Should load");

        assert_eq!(config.optimizer.max_generations, 40);
        assert_eq!(config.optimizer.seed, Some(7));
        assert_eq!(config.embedding.timeout_secs, 5);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut temp_file = NamedTempFile::new().expect("Should create temp file");
        temp_file
            .write_all(b"optimizer:\n  population_size: 4\n  elite_size: 8\n")
            .expect("Should write");

        let err = Config::load_from_file(temp_file.path()).unwrap_err();
        assert_eq!(err.code(), "E004");
    }

    #[test]
    fn test_load_rejects_malformed_yaml() {
        let mut temp_file = NamedTempFile::new().expect("Should create temp file");
        temp_file
            .write_all(b"optimizer: [not, a, map\n")
            .expect("Should write");

        let err = Config::load_from_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalidFormat { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::tempdir().expect("Should create temp dir");
        let err = Config::load_from_file(&temp_dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigFileNotFound { .. }));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().expect("Should create temp dir");
        let config_path = temp_dir.path().join("nested").join("config.yaml");

        let original = Config {
            optimizer: OptimizerConfig::fast().with_seed(11),
            embedding: EmbeddingConfig {
                endpoint: "http://embed.local:11434".to_string(),
                cache_capacity: 0,
                ..EmbeddingConfig::default()
            },
        };

        original.save(&config_path).expect("Should save");
        let loaded = Config::load_from_file(&config_path).expect("Should load");

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_config_path_returns_valid_path() {
        let path = Config::config_path();
        assert!(path.to_string_lossy().ends_with("config.yaml"));
        assert!(path.to_string_lossy().contains("prompt-evolver"));
    }
}
