use thiserror::Error;

pub type Result<T> = std::result::Result<T, FaqError>;

#[derive(Error, Debug)]
pub enum FaqError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source load error: {0}")]
    Load(#[from] loader::LoadError),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Language model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod answerer;
pub mod commands;
pub mod config;
pub mod embeddings;
mod http;
pub mod indexer;
pub mod llm;
pub mod loader;
pub mod prompt;
pub mod retriever;
pub mod vector_store;
