// Configuration management module
// Handles TOML configuration loading, validation, and filesystem paths

pub mod settings;

pub use settings::{
    ChunkingConfig, Config, ConfigError, GenerationConfig, OllamaConfig, RetrievalConfig,
};

/// Get the default configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("docqa"))
        .ok_or(ConfigError::DirectoryError)
}
