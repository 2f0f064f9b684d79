//! Error types for prompt-evolver.
//!
//! This module provides error handling with:
//! - Error codes for programmatic handling (E001-E099)
//! - User-friendly messages with actionable suggestions
//! - Structured error types using thiserror
//!
//! # Error Code Ranges
//!
//! | Range | Category |
//! |-------|----------|
//! | E001-E009 | Configuration errors |
//! | E010-E019 | Input validation errors |
//! | E020-E029 | Embedding errors |
//! | E030-E039 | API/Network errors |
//! | E070-E079 | I/O errors |
//! | E080-E089 | Serialization errors |
//! | E090-E099 | Internal errors |
//!
//! ## Macros
//!
//! The [`bail_if!`] macro provides early return on condition:
//!
//! ```ignore
//! use prompt_evolver::error::{bail_if, Error, Result};
//!
//! fn check_population(size: usize) -> Result<()> {
//!     bail_if!(size == 0, Error::config_invalid_value("population_size", "must be > 0"));
//!     Ok(())
//! }
//! ```

use thiserror::Error;

// =============================================================================
// BAIL_IF MACRO
// =============================================================================

/// Early return if condition is true.
///
/// # Examples
///
/// ```ignore
/// use prompt_evolver::error::{bail_if, Error, Result};
///
/// fn check_rate(rate: f64) -> Result<()> {
///     bail_if!(!(0.0..=1.0).contains(&rate), Error::config_invalid_value("rate", "out of range"));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! bail_if {
    ($cond:expr, $err:expr) => {
        if $cond {
            return Err($err);
        }
    };
}

pub use crate::bail_if;

// =============================================================================
// ERROR TYPE
// =============================================================================

/// The main error type for prompt-evolver.
///
/// Each variant includes an error code prefix for easy identification.
/// Use [`Error::suggestion`] to get guidance for resolving the error.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // CONFIGURATION ERRORS (E001-E009)
    // =========================================================================
    /// Configuration file not found.
    #[error("[E001] Configuration file not found: {path}")]
    ConfigFileNotFound { path: String },

    /// Configuration file has invalid format.
    #[error("[E002] Invalid configuration format in {path}: {details}")]
    ConfigInvalidFormat { path: String, details: String },

    /// A configuration or call parameter violates its invariant.
    #[error("[E004] Invalid configuration value for '{key}': {details}")]
    ConfigInvalidValue { key: String, details: String },

    // =========================================================================
    // INPUT VALIDATION ERRORS (E010-E019)
    // =========================================================================
    /// The prompt is empty or whitespace only.
    #[error("[E010] Cannot optimize an empty prompt")]
    EmptyPrompt,

    // =========================================================================
    // EMBEDDING ERRORS (E020-E029)
    // =========================================================================
    /// The oracle could not produce an embedding for one text.
    #[error("[E020] Embedding unavailable: {reason}")]
    EmbeddingUnavailable { reason: String },

    /// The original prompt could not be embedded, so no baseline exists.
    #[error("[E021] Failed to embed the original prompt: {source}")]
    OriginalEmbeddingFailed {
        #[source]
        source: Box<Error>,
    },

    /// Two vectors of different length were compared.
    #[error("[E022] Vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    // =========================================================================
    // API/NETWORK ERRORS (E030-E039)
    // =========================================================================
    /// API endpoint is unreachable.
    #[error("[E030] Cannot connect to API at {endpoint}")]
    ApiConnectionFailed {
        endpoint: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// API request timed out.
    #[error("[E031] API request timed out after {timeout_secs}s")]
    ApiTimeout { timeout_secs: u64 },

    /// API returned an error response.
    #[error("[E032] API error ({status}): {message}")]
    ApiResponse { status: u16, message: String },

    /// HTTP client error.
    #[error("[E035] HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // =========================================================================
    // I/O ERRORS (E070-E079)
    // =========================================================================
    /// General I/O error.
    #[error("[E073] I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // SERIALIZATION ERRORS (E080-E089)
    // =========================================================================
    /// JSON serialization/deserialization error.
    #[error("[E080] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("[E081] YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // =========================================================================
    // INTERNAL ERRORS (E090-E099)
    // =========================================================================
    /// Unexpected internal error.
    #[error("[E090] Internal error: {message}")]
    Internal { message: String },
}

// =============================================================================
// ERROR CONSTRUCTORS
// =============================================================================

impl Error {
    /// Create a configuration file not found error.
    pub fn config_file_not_found(path: impl Into<String>) -> Self {
        Self::ConfigFileNotFound { path: path.into() }
    }

    /// Create an invalid configuration format error.
    pub fn config_invalid_format(path: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ConfigInvalidFormat {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create an invalid configuration value error.
    pub fn config_invalid_value(key: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ConfigInvalidValue {
            key: key.into(),
            details: details.into(),
        }
    }

    /// Create an embedding unavailable error.
    pub fn embedding_unavailable(reason: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable {
            reason: reason.into(),
        }
    }

    /// Wrap the failure that prevented embedding the original prompt.
    pub fn original_embedding_failed(source: Error) -> Self {
        Self::OriginalEmbeddingFailed {
            source: Box::new(source),
        }
    }

    /// Create an API connection failed error.
    pub fn api_connection_failed(endpoint: impl Into<String>) -> Self {
        Self::ApiConnectionFailed {
            endpoint: endpoint.into(),
            source: None,
        }
    }

    /// Create an API connection failed error with the underlying cause.
    pub fn api_connection_failed_with_source(
        endpoint: impl Into<String>,
        source: reqwest::Error,
    ) -> Self {
        Self::ApiConnectionFailed {
            endpoint: endpoint.into(),
            source: Some(source),
        }
    }

    /// Create an API timeout error.
    pub fn api_timeout(timeout_secs: u64) -> Self {
        Self::ApiTimeout { timeout_secs }
    }

    /// Create an API response error.
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// =============================================================================
// ERROR METADATA
// =============================================================================

impl Error {
    /// Get the error code (e.g., "E004").
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigFileNotFound { .. } => "E001",
            Self::ConfigInvalidFormat { .. } => "E002",
            Self::ConfigInvalidValue { .. } => "E004",

            Self::EmptyPrompt => "E010",

            Self::EmbeddingUnavailable { .. } => "E020",
            Self::OriginalEmbeddingFailed { .. } => "E021",
            Self::DimensionMismatch { .. } => "E022",

            Self::ApiConnectionFailed { .. } => "E030",
            Self::ApiTimeout { .. } => "E031",
            Self::ApiResponse { .. } => "E032",
            Self::Http(_) => "E035",

            Self::Io(_) => "E073",

            Self::Json(_) => "E080",
            Self::Yaml(_) => "E081",

            Self::Internal { .. } => "E090",
        }
    }

    /// Get a suggestion for how to resolve the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ConfigFileNotFound { .. } => {
                Some("Create the configuration file or omit the path to use defaults")
            }
            Self::ConfigInvalidFormat { .. } => Some(
                "Check the configuration file syntax. YAML format is required",
            ),
            Self::ConfigInvalidValue { .. } => Some(
                "Rates and thresholds must lie in [0, 1] and elite_size must be \
                 between 1 and population_size",
            ),

            Self::EmptyPrompt => Some("Provide a non-empty prompt to optimize"),

            Self::EmbeddingUnavailable { .. } => {
                Some("Check that the embedding service is running and the model is pulled")
            }
            Self::OriginalEmbeddingFailed { .. } => Some(
                "The original prompt must be embeddable. Check the embedding endpoint \
                 and model name",
            ),
            Self::DimensionMismatch { .. } => {
                Some("All embeddings must come from the same model")
            }

            Self::ApiConnectionFailed { .. } => Some(
                "Check that the embedding service is reachable at the configured endpoint",
            ),
            Self::ApiTimeout { .. } => Some(
                "Increase `timeout_secs` in the embedding configuration, \
                 or check your network connection",
            ),
            Self::ApiResponse { status, .. } if *status == 404 => Some(
                "The embedding model or route was not found. Pull the model first",
            ),
            Self::ApiResponse { status, .. } if *status == 429 => Some(
                "Rate limit exceeded. Wait a moment and try again",
            ),
            Self::ApiResponse { status, .. } if *status >= 500 => {
                Some("The embedding server is experiencing issues. Try again later")
            }
            Self::ApiResponse { .. } => Some("Check the API documentation for this status code"),
            Self::Http(_) => Some("Check your network connection and try again"),

            Self::Io(_) => Some("Check file permissions and disk space"),

            Self::Json(_) => Some("Check the JSON syntax for errors"),
            Self::Yaml(_) => {
                Some("Check the YAML syntax for errors. Use a YAML validator if needed")
            }

            Self::Internal { .. } => Some("This is an internal error. Please report it"),
        }
    }

    /// Check if this error is a configuration problem raised before any work.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigFileNotFound { .. }
                | Self::ConfigInvalidFormat { .. }
                | Self::ConfigInvalidValue { .. }
        )
    }
}

// =============================================================================
// RESULT TYPE ALIAS
// =============================================================================

/// A Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// TESTS
// =============================================================================
