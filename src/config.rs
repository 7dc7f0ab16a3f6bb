//! Configuration management for minirag
//!
//! TOML-based configuration with defaults and validation.
//! Location: ~/.minirag/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{RagError, Result};

/// Complete configuration, read once at startup and passed to the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Filesystem path to the model artifact
    #[serde(alias = "modelo_caminho", default = "default_model_path")]
    pub model_path: String,
    /// Which backend loads and runs the model
    #[serde(default)]
    pub backend: ModelBackend,
    /// Tokenizer for the GGUF backend (defaults to `tokenizer.json` beside the model)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_path: Option<String>,
    /// HuggingFace repo to fetch `tokenizer.json` from when none is on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_repo: Option<String>,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Model backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// Local quantized llama weights run in-process
    #[default]
    Gguf,
    /// Model served by a local Ollama instance
    Ollama,
}

/// Sampling parameters shared by both backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_tokens: usize,
    /// 0.0 means greedy decoding
    pub temperature: f64,
    pub seed: u64,
}

/// Ollama connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
}

fn default_model_path() -> String {
    "~/.minirag/models/model.gguf".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            backend: ModelBackend::default(),
            tokenizer_path: None,
            tokenizer_repo: None,
            generation: GenerationConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.8,
            seed: 299_792_458,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
            model: "llama3.1:8b".to_string(),
        }
    }
}

impl ModelBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelBackend::Gguf => "gguf",
            ModelBackend::Ollama => "ollama",
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file.
    ///
    /// Not validated here: command-line overrides still apply, so callers run
    /// `validate()` on the final value.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::Config(format!("Failed to read config {}: {}", path.display(), e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load from the standard location, or fall back to built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".minirag").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            ModelBackend::Gguf if self.model_path.trim().is_empty() => {
                return Err(RagError::Config("model_path must not be empty".to_string()));
            }
            ModelBackend::Ollama if self.ollama.model.trim().is_empty() => {
                return Err(RagError::Config("ollama.model must not be empty".to_string()));
            }
            _ => {}
        }

        if self.generation.max_tokens == 0 {
            return Err(RagError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.generation.temperature < 0.0 {
            return Err(RagError::Config(format!(
                "temperature must not be negative (got {})",
                self.generation.temperature
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RagError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Model path with `~/` expanded
    pub fn model_path(&self) -> PathBuf {
        Self::expand_path(&self.model_path)
    }

    /// Explicit tokenizer path with `~/` expanded, if configured
    pub fn tokenizer_path(&self) -> Option<PathBuf> {
        self.tokenizer_path.as_deref().map(Self::expand_path)
    }

    /// Get Ollama base URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }
}
