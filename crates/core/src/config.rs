//! Configuration management for the Hearth RAG assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (hearth.yaml)
//!
//! Defaults mirror the curated corpus deployment: a `data/` directory with one
//! CSV file and a LanceDB directory next to it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// How the pipeline selects context for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetrievalMode {
    /// Vector search plus optional cross-encoder reranking.
    Semantic,
    /// One corpus record picked uniformly at random; no index, no reranker.
    Random,
}

impl RetrievalMode {
    /// Parse mode from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "semantic" => Some(Self::Semantic),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// Which of the fixed system-instruction texts is sent to the generation model.
///
/// The instruction texts themselves live in the prompt crate; this enum is the
/// configuration surface selecting between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptVariant {
    /// The original poetic-recipe instruction.
    Standard,
    /// Adds the rule that only the main ingredient is substituted and
    /// auxiliary ingredients stay physical.
    StrictIngredients,
}

impl PromptVariant {
    /// Parse variant from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "strict-ingredients" | "strict" => Some(Self::StrictIngredients),
            _ => None,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory containing the tabular corpus (data.csv)
    pub data_dir: PathBuf,

    /// Directory where the vector index is persisted
    pub persist_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat-completion provider (e.g., "ollama", "openai")
    pub provider: String,

    /// Chat model identifier
    pub model: String,

    /// Custom endpoint for the chat provider
    pub endpoint: Option<String>,

    /// API key for providers that require one
    pub api_key: Option<String>,

    /// Embedding provider (e.g., "ollama", "mock")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding vector dimension
    pub embedding_dim: usize,

    /// Base URL of the cross-encoder rerank service
    pub rerank_url: String,

    /// Cross-encoder model identifier (informational, passed to the service)
    pub rerank_model: String,

    /// Maximum chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Default number of candidates fetched by similarity search
    pub pool_size: usize,

    /// Default number of chunks kept after reranking/truncation
    pub top_k: usize,

    /// Default sampling temperature for generation
    pub temperature: f32,

    /// Context selection strategy
    pub retrieval_mode: RetrievalMode,

    /// System-instruction variant
    pub prompt_variant: PromptVariant,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    data: Option<DataConfig>,
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    rerank: Option<RerankSection>,
    retrieval: Option<RetrievalSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DataConfig {
    data_dir: Option<String>,
    persist_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RerankSection {
    url: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalSection {
    mode: Option<RetrievalMode>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    pool_size: Option<usize>,
    top_k: Option<usize>,
    temperature: Option<f32>,
    prompt_variant: Option<PromptVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            persist_dir: PathBuf::from("lance_db"),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            rerank_url: "http://localhost:8090".to_string(),
            rerank_model: "BAAI/bge-reranker-base".to_string(),
            chunk_size: 1600,
            chunk_overlap: 300,
            pool_size: 25,
            top_k: 4,
            temperature: 0.8,
            retrieval_mode: RetrievalMode::Semantic,
            prompt_variant: PromptVariant::Standard,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `HEARTH_DATA_DIR`: Directory holding the corpus CSV
    /// - `HEARTH_PERSIST_DIR`: Directory for the persisted index
    /// - `HEARTH_CONFIG`: Path to config file
    /// - `HEARTH_PROVIDER`: Chat provider
    /// - `HEARTH_MODEL`: Chat model identifier
    /// - `HEARTH_API_KEY`: API key
    /// - `HEARTH_EMBEDDING_MODEL`: Embedding model identifier
    /// - `HEARTH_RERANK_URL`: Rerank service base URL
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(data_dir) = std::env::var("HEARTH_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(persist_dir) = std::env::var("HEARTH_PERSIST_DIR") {
            config.persist_dir = PathBuf::from(persist_dir);
        }

        if let Ok(config_file) = std::env::var("HEARTH_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            PathBuf::from("hearth.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("HEARTH_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("HEARTH_MODEL") {
            config.model = model;
        }

        if let Ok(embedding_model) = std::env::var("HEARTH_EMBEDDING_MODEL") {
            config.embedding_model = embedding_model;
        }

        if let Ok(rerank_url) = std::env::var("HEARTH_RERANK_URL") {
            config.rerank_url = rerank_url;
        }

        if let Some(key) = std::env::var("HEARTH_API_KEY").ok().filter(|k| !k.is_empty()) {
            config.api_key = Some(key);
        }
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(data) = config_file.data {
            if let Some(dir) = data.data_dir {
                result.data_dir = PathBuf::from(dir);
            }
            if let Some(dir) = data.persist_dir {
                result.persist_dir = PathBuf::from(dir);
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
        }

        if let Some(embedding) = config_file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
            if let Some(dim) = embedding.dimensions {
                result.embedding_dim = dim;
            }
        }

        if let Some(rerank) = config_file.rerank {
            if let Some(url) = rerank.url {
                result.rerank_url = url;
            }
            if let Some(model) = rerank.model {
                result.rerank_model = model;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(mode) = retrieval.mode {
                result.retrieval_mode = mode;
            }
            if let Some(size) = retrieval.chunk_size {
                result.chunk_size = size;
            }
            if let Some(overlap) = retrieval.chunk_overlap {
                result.chunk_overlap = overlap;
            }
            if let Some(pool) = retrieval.pool_size {
                result.pool_size = pool;
            }
            if let Some(top_k) = retrieval.top_k {
                result.top_k = top_k;
            }
            if let Some(temperature) = retrieval.temperature {
                result.temperature = temperature;
            }
            if let Some(variant) = retrieval.prompt_variant {
                result.prompt_variant = variant;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        persist_dir: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }

        if let Some(persist_dir) = persist_dir {
            self.persist_dir = persist_dir;
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama", "openai"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.provider == "openai" && self.api_key.is_none() {
            return Err(AppError::Config(
                "OpenAI provider requires HEARTH_API_KEY".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be in [0.0, 2.0], got {}",
                self.temperature
            )));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.chunk_size, 1600);
        assert_eq!(config.chunk_overlap, 300);
        assert_eq!(config.pool_size, 25);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.retrieval_mode, RetrievalMode::Semantic);
        assert!(!config.verbose);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some(PathBuf::from("/tmp/corpus")),
            None,
            Some("openai".to_string()),
            Some("gpt-4o-mini".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.data_dir, PathBuf::from("/tmp/corpus"));
        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4o-mini");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_openai_requires_key() {
        let mut config = AppConfig::default();
        config.provider = "openai".to_string();
        assert!(config.validate().is_err());

        config.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_temperature_range() {
        let mut config = AppConfig::default();
        config.temperature = 2.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_overlap_smaller_than_size() {
        let mut config = AppConfig::default();
        config.chunk_size = 100;
        config.chunk_overlap = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retrieval_mode_parsing() {
        assert_eq!(RetrievalMode::parse("semantic"), Some(RetrievalMode::Semantic));
        assert_eq!(RetrievalMode::parse("random"), Some(RetrievalMode::Random));
        assert_eq!(RetrievalMode::parse("hybrid"), None);
    }

    #[test]
    fn test_prompt_variant_parsing() {
        assert_eq!(PromptVariant::parse("standard"), Some(PromptVariant::Standard));
        assert_eq!(
            PromptVariant::parse("strict-ingredients"),
            Some(PromptVariant::StrictIngredients)
        );
        assert_eq!(PromptVariant::parse("other"), None);
    }
}
