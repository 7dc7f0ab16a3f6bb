//! Integration tests for the retrieve -> prompt -> model pipeline
//!
//! Runs without a model on disk or an Ollama server: the model is a stub
//! or a wiremock server.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use minirag::{
    cli::DEFAULT_QUERY, format_prompt, retrieve_information, Config, LanguageModel, ModelBackend,
    RagError, ResponseGenerator, Result, StaticRetriever,
};

const FRAGMENTS: [&str; 3] = [
    "Exemplo de informação 1 relacionada à consulta",
    "Exemplo de informação 2 relacionada à consulta",
    "Exemplo de informação 3 relacionada à consulta",
];

#[derive(Clone, Default)]
struct RecordingModel {
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl LanguageModel for RecordingModel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("A energia renovável reduz emissões.".to_string())
    }
}

#[test]
fn test_renewable_energy_prompt() {
    let query = "Qual é a importância da energia renovável?";
    assert_eq!(query, DEFAULT_QUERY);

    let prompt = format_prompt(query, &retrieve_information(query));

    let expected = format!(
        "Consulta: {}\nInformações relevantes:\n{}\n{}\n{}\nResposta:",
        query, FRAGMENTS[0], FRAGMENTS[1], FRAGMENTS[2]
    );
    assert_eq!(prompt, expected);

    // query first, then the fragments in order, then the marker
    let query_at = prompt.find(query).unwrap();
    let mut last = query_at;
    for fragment in FRAGMENTS {
        let at = prompt.find(fragment).unwrap();
        assert!(at > last);
        last = at;
    }
    assert!(prompt.ends_with("Resposta:"));
}

#[tokio::test]
async fn test_generator_end_to_end_with_stub_model() {
    let model = RecordingModel::default();
    let generator =
        ResponseGenerator::with_parts(Box::new(model.clone()), Box::new(StaticRetriever::new()));

    let query = "Qual é a importância da energia renovável?";
    assert_eq!(generator.build_prompt(query), format_prompt(query, &retrieve_information(query)));

    let answer = generator.generate_response(query).await.unwrap();
    assert_eq!(answer, "A energia renovável reduz emissões.");

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0], generator.build_prompt(query));
}

#[tokio::test]
async fn test_nonexistent_model_path_fails() {
    let config = Config {
        model_path: "/nonexistent/models/llama.gguf".to_string(),
        backend: ModelBackend::Gguf,
        ..Default::default()
    };

    let err = match ResponseGenerator::new(&config).await {
        Ok(_) => panic!("construction must fail for a missing model"),
        Err(e) => e,
    };
    assert!(matches!(err, RagError::ModelLoad { .. }));
    assert!(err.to_string().contains("/nonexistent/models/llama.gguf"));
}

#[tokio::test]
async fn test_generator_over_ollama() {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "models": [{ "name": "llama3.1:8b" }] })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(|req: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            let prompt = body["prompt"].as_str().unwrap_or_default();
            let lines = prompt.lines().count();
            ResponseTemplate::new(200).set_body_json(json!({
                "response": format!("prompt had {} lines", lines),
                "done": true
            }))
        })
        .expect(1)
        .mount(&server)
        .await;

    let address = server.address();
    let mut config = Config::default();
    config.backend = ModelBackend::Ollama;
    config.ollama.host = address.ip().to_string();
    config.ollama.port = address.port();
    config.ollama.model = "llama3.1:8b".to_string();

    let generator = ResponseGenerator::new(&config).await.unwrap();
    assert_eq!(generator.model_name(), "llama3.1:8b");

    // Consulta, header, three fragments, marker
    let answer = generator.generate_response("Q").await.unwrap();
    assert_eq!(answer, "prompt had 6 lines");
}
