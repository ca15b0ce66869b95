
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::index::DistanceMetric;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Connection settings for the Ollama server providing both the embedding
/// and the generation capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub embedding_model: String,
    pub generation_model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            embedding_model: "nomic-embed-text:latest".to_string(),
            generation_model: "llama3.1:latest".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Chunker parameters, measured in characters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub metric: DistanceMetric,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: 4,
            metric: DistanceMetric::Cosine,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Hard character budget for the context injected into a prompt.
    pub max_context_chars: usize,
    pub max_output_tokens: u32,
    /// Number of leading chunks summarized independently before the reduce
    /// pass in map-reduce summarization.
    pub map_chunk_limit: usize,
}

impl Default for GenerationConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_context_chars: 12_000,
            max_output_tokens: 1024,
            map_chunk_limit: 8,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid max chunk size: {0} (must be between 1 and 100000)")]
    InvalidMaxChunkSize(usize),
    #[error("Invalid overlap: {0} (must be less than max chunk size {1})")]
    InvalidOverlap(usize, usize),
    #[error("Invalid top_k: {0} (must be at least 1)")]
    InvalidTopK(usize),
    #[error("Invalid context budget: {0} (must be at least 1)")]
    InvalidContextBudget(usize),
    #[error("Invalid max output tokens: {0} (must be at least 1)")]
    InvalidMaxOutputTokens(u32),
    #[error("Invalid map chunk limit: {0} (must be at least 1)")]
    InvalidMapChunkLimit(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                ollama: OllamaConfig::default(),
                chunking: ChunkingConfig::default(),
                retrieval: RetrievalConfig::default(),
                generation: GenerationConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.base_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ollama.validate()?;
        self.chunking.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidTopK(self.retrieval.top_k));
        }

        if self.generation.max_context_chars == 0 {
            return Err(ConfigError::InvalidContextBudget(
                self.generation.max_context_chars,
            ));
        }

        if self.generation.max_output_tokens == 0 {
            return Err(ConfigError::InvalidMaxOutputTokens(
                self.generation.max_output_tokens,
            ));
        }

        if self.generation.map_chunk_limit == 0 {
            return Err(ConfigError::InvalidMapChunkLimit(
                self.generation.map_chunk_limit,
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    /// Path of the SQLite database holding users and the document log
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.base_dir.join("metadata.db")
    }

    /// Path of the persisted vector index snapshot
    #[inline]
    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join("index.json")
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.generation_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.generation_model.clone()));
        }

        if self.timeout_seconds == 0 || self.timeout_seconds > 600 {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        Ok(())
    }

    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_size == 0 || self.max_chunk_size > 100_000 {
            return Err(ConfigError::InvalidMaxChunkSize(self.max_chunk_size));
        }

        if self.overlap >= self.max_chunk_size {
            return Err(ConfigError::InvalidOverlap(
                self.overlap,
                self.max_chunk_size,
            ));
        }

        Ok(())
    }
}
