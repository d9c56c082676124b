//! Configuration types and layered loading.
//!
//! Grounded in the teacher's `infrastructure::config::loader::ConfigLoader`:
//! embedded TOML defaults, overridable by environment variables, validated
//! with `validator`. The CLI/session config surface the teacher also covers
//! is out of scope here (spec.md §1); only the engine's own settings.

use crate::domain::error::{Error, Result};
use config::{Config as ConfigBuilder, Environment, FileFormat};
use serde::{Deserialize, Serialize};
use validator::Validate;

const DEFAULT_CONFIG_TOML: &str = include_str!("../../config/default.toml");

/// Batch sizes and other orchestrator-wide knobs.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IndexingConfig {
    /// Default batch size for chunk persistence and embedding generation.
    #[validate(range(min = 1, message = "batch_size must be positive"))]
    pub batch_size: usize,
}

/// Local embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmbeddingConfig {
    /// Vector length the local provider produces.
    #[validate(range(min = 1, message = "dimension must be positive"))]
    pub dimension: usize,
    /// Maximum chunks embedded in a single provider call.
    #[validate(range(min = 1, message = "max_batch_size must be positive"))]
    pub max_batch_size: usize,
    /// Name recorded on embeddings produced by the local provider.
    pub model_name: String,
    /// Remote provider settings, used by the hybrid provider as a fallback.
    #[validate(nested)]
    pub remote: RemoteEmbeddingConfig,
}

/// Remote embedding provider settings. `enabled = false` means the hybrid
/// provider never falls back past the local provider.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RemoteEmbeddingConfig {
    /// Whether the hybrid provider may call out to the remote provider.
    pub enabled: bool,
    /// Base URL of the remote embedding service.
    pub base_url: String,
    /// Name recorded on embeddings produced by the remote provider.
    pub model_name: String,
    /// Vector length the remote provider produces.
    #[validate(range(min = 1, message = "dimension must be positive"))]
    pub dimension: usize,
}

/// Search/enrichment defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchConfig {
    /// Default top-`k` when a caller doesn't specify one.
    #[validate(range(min = 1, message = "default_k must be positive"))]
    pub default_k: usize,
    /// Default similarity threshold when a caller doesn't specify one.
    pub default_threshold: f32,
    /// Maximum chunks included in a PRD-enrichment response.
    #[validate(range(min = 1, message = "enrich_max_chunks must be positive"))]
    pub enrich_max_chunks: usize,
    /// Maximum chunks rendered inline in `context_markdown` before
    /// summarizing the rest.
    #[validate(range(min = 1, message = "inline_chunk_limit must be positive"))]
    pub inline_chunk_limit: usize,
}

/// Rate-limit backoff policy parameters (spec.md §5).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackoffConfig {
    /// Delay before the first retry, in milliseconds.
    #[validate(range(min = 1, message = "initial_delay_ms must be positive"))]
    pub initial_delay_ms: u64,
    /// Ceiling the exponential backoff delay never exceeds, in milliseconds.
    #[validate(range(min = 1, message = "max_delay_ms must be positive"))]
    pub max_delay_ms: u64,
    /// Maximum retry attempts before giving up.
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub max_attempts: u32,
}

/// Root configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Orchestrator-wide knobs.
    #[validate(nested)]
    pub indexing: IndexingConfig,
    /// Embedding provider settings.
    #[validate(nested)]
    pub embedding: EmbeddingConfig,
    /// Search/enrichment defaults.
    #[validate(nested)]
    pub search: SearchConfig,
    /// Rate-limit retry policy.
    #[validate(nested)]
    pub backoff: BackoffConfig,
}

/// Loads [`EngineConfig`] from embedded defaults, an optional TOML file, and
/// environment variables (prefix `CODE_INDEX__`, `__`-separated), in that
/// increasing order of precedence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load using only the embedded defaults and environment overrides.
    pub fn load(&self) -> Result<EngineConfig> {
        self.build(None)
    }

    /// Load with an additional TOML file layered between defaults and
    /// environment variables.
    pub fn load_with_file(&self, path: &std::path::Path) -> Result<EngineConfig> {
        self.build(Some(path))
    }

    fn build(&self, path: Option<&std::path::Path>) -> Result<EngineConfig> {
        let mut builder = ConfigBuilder::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG_TOML,
            FileFormat::Toml,
        ));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix("CODE_INDEX")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build configuration: {e}")))?;
        let engine_config: EngineConfig = built
            .try_deserialize()
            .map_err(|e| Error::config(format!("failed to deserialize configuration: {e}")))?;
        engine_config
            .validate()
            .map_err(|e| Error::config(format!("configuration validation failed: {e}")))?;
        Ok(engine_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_load_and_validate() {
        let config = ConfigLoader::new().load().expect("defaults should load");
        assert_eq!(config.indexing.batch_size, 50);
        assert_eq!(config.embedding.dimension, 768);
        assert!(!config.embedding.remote.enabled);
    }

    #[test]
    fn env_override_takes_precedence() {
        std::env::set_var("CODE_INDEX__INDEXING__BATCH_SIZE", "10");
        let config = ConfigLoader::new().load().expect("should load");
        assert_eq!(config.indexing.batch_size, 10);
        std::env::remove_var("CODE_INDEX__INDEXING__BATCH_SIZE");
    }
}
