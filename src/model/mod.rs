//! Language model backends
//!
//! The generator only sees the [`LanguageModel`] trait. Two backends exist:
//! - [`GgufModel`]: quantized llama weights loaded from disk and run with candle
//! - [`OllamaModel`]: a model served by a local Ollama instance

pub mod gguf;
pub mod ollama;

pub use gguf::GgufModel;
pub use ollama::OllamaModel;

use async_trait::async_trait;

use crate::config::{Config, ModelBackend};
use crate::errors::Result;

/// Text completion model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier used in logs and errors (model path or tag)
    fn name(&self) -> &str;

    /// Complete `prompt`, returning only the generated text
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Load the backend selected by `config`
pub async fn load_model(config: &Config) -> Result<Box<dyn LanguageModel>> {
    log::info!("Loading model with {} backend", config.backend.as_str());

    let model: Box<dyn LanguageModel> = match config.backend {
        ModelBackend::Gguf => Box::new(GgufModel::from_config(config)?),
        ModelBackend::Ollama => Box::new(
            OllamaModel::load(
                &config.ollama_url(),
                &config.ollama.model,
                config.generation.clone(),
            )
            .await?,
        ),
    };

    log::info!("Model ready: {}", model.name());
    Ok(model)
}
