use super::*;

fn test_config() -> OllamaConfig {
    OllamaConfig {
        protocol: "http".to_string(),
        host: "ollama.internal".to_string(),
        port: 8080,
        embedding_model: "nomic-embed-text:latest".to_string(),
        generation_model: "llama3.1:latest".to_string(),
        batch_size: 16,
        max_concurrency: 4,
    }
}

#[test]
fn client_configuration_from_config() {
    let client = OllamaClient::new(&test_config()).unwrap();
    assert_eq!(client.base_url.as_str(), "http://ollama.internal:8080/");
    assert_eq!(client.model, "nomic-embed-text:latest");
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn with_retry_attempts_overrides_default() {
    let client = OllamaClient::new(&test_config())
        .unwrap()
        .with_retry_attempts(7);
    assert_eq!(client.retry_attempts, 7);
}

#[test]
fn with_timeout_rebuilds_agent() {
    // Only checks the builder chain holds together.
    let client = OllamaClient::new(&test_config())
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    assert_eq!(client.model, "nomic-embed-text:latest");
}

#[test]
fn embed_request_serializes_model_and_input() {
    let request = EmbedRequest {
        model: "nomic-embed-text:latest".to_string(),
        input: vec!["first".to_string(), "second".to_string()],
    };
    let json = serde_json::to_string(&request).unwrap();
    assert_eq!(
        json,
        r#"{"model":"nomic-embed-text:latest","input":["first","second"]}"#
    );
}

#[test]
fn embed_response_parses_embeddings() {
    let json = r#"{"embeddings":[[0.1,0.2],[0.3,0.4]],"model":"nomic-embed-text:latest"}"#;
    let response: EmbedResponse = serde_json::from_str(json).unwrap();
    assert_eq!(response.embeddings.len(), 2);
    assert_eq!(response.embeddings[0], vec![0.1, 0.2]);
}

#[test]
fn models_response_parses_names() {
    let json = r#"{"models":[{"name":"llama3.1:latest","size":123},{"name":"nomic-embed-text:latest"}]}"#;
    let response: ModelsResponse = serde_json::from_str(json).unwrap();
    let names: Vec<&str> = response.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["llama3.1:latest", "nomic-embed-text:latest"]);
}

#[test]
fn embed_empty_input_skips_the_server() {
    // No server is listening on this port; an empty batch must not hit it.
    let client = OllamaClient::new(&test_config()).unwrap();
    let vectors = client.embed(&[]).unwrap();
    assert!(vectors.is_empty());
}

#[test]
fn unreachable_server_yields_embedding_error() {
    let config = OllamaConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..test_config()
    };
    let client = OllamaClient::new(&config)
        .unwrap()
        .with_retry_attempts(1)
        .with_timeout(Duration::from_millis(200));
    let result = client.embed(&["hello".to_string()]);
    assert!(matches!(result, Err(TextQaError::Embedding(_))));
}
