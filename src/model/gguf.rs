//! Local GGUF backend
//!
//! Loads quantized llama weights with candle and decodes token by token.
//! The tokenizer is a HuggingFace `tokenizer.json`, looked up beside the
//! model file unless configured explicitly.

use async_trait::async_trait;
use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama::ModelWeights;
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::config::{Config, GenerationConfig};
use crate::errors::{RagError, Result};
use crate::model::LanguageModel;

/// Rotary tables in candle's quantized llama are precomputed up to this length
const MAX_CONTEXT_LENGTH: usize = 4096;

const TOKENIZER_FILE: &str = "tokenizer.json";

/// End-of-sequence spellings across llama-family tokenizers
const EOS_CANDIDATES: [&str; 4] = ["</s>", "<|eot_id|>", "<|end_of_text|>", "<|endoftext|>"];

/// Quantized llama model running in-process
pub struct GgufModel {
    name: String,
    // forward() needs &mut for the KV cache
    weights: Mutex<ModelWeights>,
    tokenizer: Tokenizer,
    device: Device,
    eos_token: Option<u32>,
    context_length: usize,
    params: GenerationConfig,
}

impl GgufModel {
    /// Load using the model path, tokenizer settings and sampling parameters in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.model_path();
        ensure_model_file(&path)?;

        let tokenizer_path = match config.tokenizer_path() {
            Some(explicit) => explicit,
            None => {
                let sibling = default_tokenizer_path(&path);
                match config.tokenizer_repo.as_deref() {
                    Some(repo_id) if !sibling.exists() => fetch_tokenizer(repo_id)?,
                    _ => sibling,
                }
            }
        };

        Self::load(&path, Some(tokenizer_path.as_path()), config.generation.clone())
    }

    /// Load a GGUF model file.
    ///
    /// Fails with `RagError::ModelLoad` if the file is missing, is not GGUF,
    /// or its tokenizer cannot be read.
    pub fn load(
        path: &Path,
        tokenizer_path: Option<&Path>,
        params: GenerationConfig,
    ) -> Result<Self> {
        ensure_model_file(path)?;
        let name = path.display().to_string();

        let tokenizer_path = tokenizer_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_tokenizer_path(path));
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            RagError::model_load(
                &name,
                format!("cannot read tokenizer {}: {}", tokenizer_path.display(), e),
            )
        })?;

        let device = Device::Cpu;
        let mut file = std::fs::File::open(path).map_err(|e| RagError::model_load(&name, e))?;
        let content = gguf_file::Content::read(&mut file)
            .map_err(|e| RagError::model_load(&name, format!("not a GGUF file: {}", e)))?;

        let context_length = content
            .metadata
            .iter()
            .find(|(key, _)| key.ends_with(".context_length"))
            .and_then(|(_, value)| value.to_u32().ok())
            .map(|n| (n as usize).min(MAX_CONTEXT_LENGTH))
            .unwrap_or(MAX_CONTEXT_LENGTH);

        let eos_token = content
            .metadata
            .get("tokenizer.ggml.eos_token_id")
            .and_then(|value| value.to_u32().ok())
            .or_else(|| {
                EOS_CANDIDATES
                    .iter()
                    .find_map(|token| tokenizer.token_to_id(token))
            });

        log::debug!(
            "GGUF metadata: {} tensors, context {}, eos {:?}",
            content.tensor_infos.len(),
            context_length,
            eos_token
        );

        let weights = ModelWeights::from_gguf(content, &mut file, &device)
            .map_err(|e| RagError::model_load(&name, e))?;

        Ok(Self {
            name,
            weights: Mutex::new(weights),
            tokenizer,
            device,
            eos_token,
            context_length,
            params,
        })
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| RagError::Tokenizer(e.to_string()))?;
        let prompt_tokens = encoding.get_ids();

        if prompt_tokens.is_empty() {
            return Err(RagError::Generation("prompt encoded to zero tokens".to_string()));
        }
        let budget = token_budget(self.params.max_tokens, self.context_length, prompt_tokens.len())?;

        let temperature = if self.params.temperature > 0.0 {
            Some(self.params.temperature)
        } else {
            None
        };
        let mut sampler = LogitsProcessor::new(self.params.seed, temperature, None);

        let mut weights = self
            .weights
            .lock()
            .map_err(|_| RagError::Generation("model state poisoned by an earlier panic".to_string()))?;

        // index_pos 0 also resets the KV cache left by a previous call
        let generated = decode(prompt_tokens, budget, self.eos_token, &mut sampler, |tokens, index_pos| {
            let input = Tensor::new(tokens, &self.device)?.unsqueeze(0)?;
            Ok(weights.forward(&input, index_pos)?.squeeze(0)?)
        })?;

        log::debug!(
            "Generated {} tokens from a {}-token prompt",
            generated.len(),
            prompt_tokens.len()
        );

        self.tokenizer
            .decode(&generated, true)
            .map_err(|e| RagError::Tokenizer(e.to_string()))
    }
}

/// Number of tokens that may be generated after a `prompt_len`-token prompt
fn token_budget(max_tokens: usize, context_length: usize, prompt_len: usize) -> Result<usize> {
    if prompt_len >= context_length {
        return Err(RagError::Generation(format!(
            "prompt has {} tokens but the model context holds {}",
            prompt_len, context_length
        )));
    }
    Ok(max_tokens.min(context_length - prompt_len))
}

/// Sample at most `budget` tokens following `prompt_tokens`.
///
/// `step(tokens, index_pos)` feeds `tokens` starting at position `index_pos`
/// and returns the logits of the last position. Stops before `eos_token`;
/// the returned ids never include the prompt.
fn decode<F>(
    prompt_tokens: &[u32],
    budget: usize,
    eos_token: Option<u32>,
    sampler: &mut LogitsProcessor,
    mut step: F,
) -> Result<Vec<u32>>
where
    F: FnMut(&[u32], usize) -> Result<Tensor>,
{
    let mut generated = Vec::with_capacity(budget);
    if budget == 0 {
        return Ok(generated);
    }

    let mut logits = step(prompt_tokens, 0)?;
    loop {
        let next = sampler.sample(&logits)?;
        if Some(next) == eos_token {
            break;
        }
        generated.push(next);
        if generated.len() == budget {
            break;
        }
        logits = step(&[next], prompt_tokens.len() + generated.len() - 1)?;
    }

    Ok(generated)
}

/// Run CPU-bound work without stalling other tasks on a multi-thread runtime.
/// `block_in_place` panics on a current-thread runtime, where the work runs inline.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(work),
        _ => work(),
    }
}

#[async_trait]
impl LanguageModel for GgufModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        run_blocking(|| self.complete(prompt))
    }
}

/// `tokenizer.json` in the same directory as the model
pub fn default_tokenizer_path(model_path: &Path) -> PathBuf {
    model_path
        .parent()
        .map(|dir| dir.join(TOKENIZER_FILE))
        .unwrap_or_else(|| PathBuf::from(TOKENIZER_FILE))
}

fn ensure_model_file(path: &Path) -> Result<()> {
    let name = path.display().to_string();
    if !path.exists() {
        return Err(RagError::model_load(name, "file not found"));
    }
    if !path.is_file() {
        return Err(RagError::model_load(name, "not a regular file"));
    }
    Ok(())
}

/// Download `tokenizer.json` from a HuggingFace model repo (cached by hf-hub)
fn fetch_tokenizer(repo_id: &str) -> Result<PathBuf> {
    log::info!("Fetching {} from {}", TOKENIZER_FILE, repo_id);

    let api = Api::new().map_err(|e| RagError::model_load(repo_id, e))?;
    let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));
    repo.get(TOKENIZER_FILE)
        .map_err(|e| RagError::model_load(repo_id, format!("cannot fetch tokenizer: {}", e)))
}
