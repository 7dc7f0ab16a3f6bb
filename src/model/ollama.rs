//! Ollama backend
//!
//! - Load: GET /api/tags, the model must already be pulled
//! - Generate: POST /api/generate with `stream: false`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::errors::{RagError, Result};
use crate::model::LanguageModel;

/// Timeout for the availability check at load time
const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

/// Request timeout for generation (local models can be slow on CPU)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Model served by a local Ollama instance
#[derive(Debug, Clone)]
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model: String,
    params: GenerationConfig,
}

impl OllamaModel {
    /// Connect to Ollama at `base_url` and check that `model` is installed
    pub async fn load(base_url: &str, model: &str, params: GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RagError::Http)?;

        let ollama = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            params,
        };

        let installed = ollama
            .list_models()
            .await
            .map_err(|e| RagError::model_load(model, e))?;

        if !installed.iter().any(|name| tag_matches(name, model)) {
            return Err(RagError::model_load(
                model,
                format!("not installed in Ollama (run: ollama pull {})", model),
            ));
        }

        Ok(ollama)
    }

    /// List installed model tags
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|e| RagError::OllamaApi(format!("Failed to connect to Ollama: {}", e)))?;

        if !response.status().is_success() {
            return Err(RagError::OllamaApi(format!(
                "API returned status: {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| RagError::OllamaApi(format!("Failed to parse models: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: self.params.max_tokens,
                temperature: self.params.temperature,
                seed: self.params.seed,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::OllamaApi(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagError::Generation(format!("HTTP {}: {}", status, error_text)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RagError::OllamaApi(format!("Failed to parse response: {}", e)))?;

        log::debug!(
            "Ollama generated {} tokens",
            body.eval_count.map_or_else(|| "?".to_string(), |n| n.to_string())
        );

        Ok(body.response)
    }
}

/// Ollama resolves a bare name to its `:latest` tag
fn tag_matches(installed: &str, requested: &str) -> bool {
    installed == requested
        || (!requested.contains(':') && installed.strip_suffix(":latest") == Some(requested))
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: usize,
    temperature: f64,
    seed: u64,
}

/// Non-streaming generate response
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Ollama API tags response
#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}
