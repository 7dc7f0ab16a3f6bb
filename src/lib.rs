//! minirag - retrieval-augmented answers from a local language model
//!
//! # Architecture
//!
//! - **retrieval**: fragments supporting a query
//! - **generation**: prompt formatting and the response generator
//! - **model**: language model backends (local GGUF via candle, Ollama over HTTP)
//! - **config** / **cli**: TOML configuration and command-line surface

pub mod errors;
pub mod config;
pub mod cli;
pub mod retrieval;
pub mod generation;
pub mod model;

// Re-export commonly used types
pub use config::{Config, ModelBackend};
pub use errors::{RagError, Result};
pub use generation::{build_prompt, format_prompt, ResponseGenerator};
pub use model::LanguageModel;
pub use retrieval::{retrieve_information, Retriever, StaticRetriever};
