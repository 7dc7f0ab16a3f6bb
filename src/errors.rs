//! Error types for minirag
//!
//! Retrieval never fails; everything here comes from loading or running
//! a model, or from reading configuration.

use thiserror::Error;

/// Main error type for the RAG pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Model artifact could not be loaded
    #[error("Failed to load model '{model}': {reason}")]
    ModelLoad { model: String, reason: String },

    /// Model failed while producing text
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Tokenizer errors (encode/decode)
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Ollama API errors
    #[error("Ollama API error: {0}")]
    OllamaApi(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tensor errors from the local backend
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

impl RagError {
    /// Build a `ModelLoad` error for the given model identifier
    pub fn model_load(model: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        RagError::ModelLoad {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;
