use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocqaError>;

#[derive(Error, Debug)]
pub enum DocqaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod auth;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod extractor;
pub mod generation;
pub mod index;
pub mod indexer;
pub mod pipeline;
