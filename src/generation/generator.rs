//! Response generation: retrieve -> format prompt -> model

use crate::config::Config;
use crate::errors::Result;
use crate::generation::prompt::format_prompt;
use crate::model::{load_model, LanguageModel};
use crate::retrieval::{Retriever, StaticRetriever};

/// Prompt for `query` grounded on what `retriever` returns (one retrieval)
pub fn build_prompt(retriever: &dyn Retriever, query: &str) -> String {
    let fragments = retriever.retrieve(query);
    format_prompt(query, &fragments)
}

/// Answers queries with a language model grounded on retrieved fragments
pub struct ResponseGenerator {
    model: Box<dyn LanguageModel>,
    retriever: Box<dyn Retriever>,
}

impl ResponseGenerator {
    /// Load the configured model and pair it with the static retriever.
    ///
    /// Fails if the model cannot be loaded.
    pub async fn new(config: &Config) -> Result<Self> {
        let model = load_model(config).await?;
        Ok(Self::with_parts(model, Box::new(StaticRetriever::new())))
    }

    /// Build from an already loaded model and a retriever
    pub fn with_parts(model: Box<dyn LanguageModel>, retriever: Box<dyn Retriever>) -> Self {
        Self { model, retriever }
    }

    /// Retrieve fragments for `query` and format the prompt
    pub fn build_prompt(&self, query: &str) -> String {
        build_prompt(self.retriever.as_ref(), query)
    }

    /// Generate an answer for `query`.
    ///
    /// The model output is returned as-is; errors from the model propagate.
    pub async fn generate_response(&self, query: &str) -> Result<String> {
        log::info!("Answering query ({} chars) with {}", query.chars().count(), self.model.name());

        let prompt = self.build_prompt(query);
        log::debug!("Prompt:\n{}", prompt);

        self.model.generate(&prompt).await
    }

    /// Name of the loaded model
    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RagError;
    use crate::retrieval::retrieve_information;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Model that records prompts and answers with a fixed string
    struct EchoModel {
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(" resposta do modelo ".to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(RagError::Generation("out of memory".to_string()))
        }
    }

    struct CountingRetriever {
        calls: Arc<AtomicUsize>,
    }

    impl Retriever for CountingRetriever {
        fn retrieve(&self, _query: &str) -> Vec<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec!["a".to_string(), "b".to_string()]
        }
    }

    #[tokio::test]
    async fn test_retriever_called_once_per_query() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = ResponseGenerator::with_parts(
            Box::new(EchoModel { prompts: prompts.clone() }),
            Box::new(CountingRetriever { calls: calls.clone() }),
        );

        generator.generate_response("Q").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        generator.generate_response("Q2").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts[0], "Consulta: Q\nInformações relevantes:\na\nb\nResposta:");
    }

    #[test]
    fn test_build_prompt_matches_generator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prompt = build_prompt(&CountingRetriever { calls: calls.clone() }, "Q");
        assert_eq!(prompt, "Consulta: Q\nInformações relevantes:\na\nb\nResposta:");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let generator = ResponseGenerator::with_parts(
            Box::new(FailingModel),
            Box::new(StaticRetriever::new()),
        );
        assert_eq!(
            generator.build_prompt("Q"),
            build_prompt(&StaticRetriever::new(), "Q")
        );
    }

    #[tokio::test]
    async fn test_model_output_returned_unmodified() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = ResponseGenerator::with_parts(
            Box::new(EchoModel { prompts: prompts.clone() }),
            Box::new(StaticRetriever::new()),
        );

        let answer = generator.generate_response("").await.unwrap();
        assert_eq!(answer, " resposta do modelo ");

        let expected = format_prompt("", &retrieve_information(""));
        assert_eq!(prompts.lock().unwrap().as_slice(), &[expected]);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let generator =
            ResponseGenerator::with_parts(Box::new(FailingModel), Box::new(StaticRetriever::new()));

        let err = generator.generate_response("Q").await.unwrap_err();
        assert!(matches!(err, RagError::Generation(ref msg) if msg == "out of memory"));
    }

    #[tokio::test]
    async fn test_new_fails_for_missing_model() {
        let config = Config {
            model_path: "/nonexistent/model.gguf".to_string(),
            ..Default::default()
        };
        let result = ResponseGenerator::new(&config).await;
        assert!(matches!(result, Err(RagError::ModelLoad { .. })));
    }
}
