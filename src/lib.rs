use thiserror::Error;

pub type Result<T> = std::result::Result<T, TextQaError>;

#[derive(Error, Debug)]
pub enum TextQaError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot build a collection from zero chunks")]
    EmptyInput,

    #[error("No store named '{0}' exists")]
    StoreNotFound(String),

    #[error("Store '{name}' is corrupt: {reason}")]
    StoreCorrupt { name: String, reason: String },

    #[error("No collection has been built or loaded in this session")]
    IndexNotReady,

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunker;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod generation;
pub mod index;
pub mod qa;
