use super::*;
use tempfile::TempDir;

fn test_config(base_dir: &Path) -> Config {
    Config {
        ollama: OllamaConfig::default(),
        chunking: ChunkingConfig::default(),
        answer: AnswerConfig::default(),
        base_dir: base_dir.to_path_buf(),
    }
}

#[test]
fn default_config_is_valid() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    assert!(config.validate().is_ok());
}

#[test]
fn defaults_match_documented_values() {
    let config = OllamaConfig::default();
    assert_eq!(config.protocol, "http");
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 11434);
    assert_eq!(config.embedding_model, "nomic-embed-text:latest");
    assert_eq!(config.generation_model, "llama3.1:latest");
    assert_eq!(config.batch_size, 16);
    assert_eq!(config.max_concurrency, 4);

    let chunking = ChunkingConfig::default();
    assert_eq!(chunking.chunk_size, 1000);
    assert_eq!(chunking.overlap, 200);

    let answer = AnswerConfig::default();
    assert_eq!(answer.top_k, 3);
    assert_eq!(answer.max_context_chars, 8000);
    assert_eq!(answer.preview_chars, 200);
}

#[test]
fn load_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::load(temp_dir.path()).unwrap();
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.chunking, ChunkingConfig::default());
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    config.ollama.host = "ollama.internal".to_string();
    config.ollama.port = 8080;
    config.chunking.chunk_size = 500;
    config.chunking.overlap = 50;
    config.answer.top_k = 5;
    config.save().unwrap();

    let loaded = Config::load(temp_dir.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn load_partial_file_fills_in_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let content = r#"
[ollama]
embedding_model = "mxbai-embed-large:latest"
"#;
    fs::write(temp_dir.path().join("config.toml"), content).unwrap();

    let config = Config::load(temp_dir.path()).unwrap();
    assert_eq!(config.ollama.embedding_model, "mxbai-embed-large:latest");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.chunking, ChunkingConfig::default());
    assert_eq!(config.answer, AnswerConfig::default());
}

#[test]
fn load_invalid_toml_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("config.toml"), "not [valid toml").unwrap();
    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().unwrap();
    let content = r#"
[ollama]
batch_size = 0
"#;
    fs::write(temp_dir.path().join("config.toml"), content).unwrap();
    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn validate_rejects_bad_protocol() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    config.ollama.protocol = "ftp".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));
}

#[test]
fn validate_rejects_zero_port() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    config.ollama.port = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(0))));
}

#[test]
fn validate_rejects_empty_models() {
    let temp_dir = TempDir::new().unwrap();

    let mut config = test_config(temp_dir.path());
    config.ollama.embedding_model = "  ".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));

    let mut config = test_config(temp_dir.path());
    config.ollama.generation_model = String::new();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));
}

#[test]
fn validate_rejects_bad_batch_size_and_concurrency() {
    let temp_dir = TempDir::new().unwrap();

    let mut config = test_config(temp_dir.path());
    config.ollama.batch_size = 1001;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidBatchSize(1001))
    ));

    let mut config = test_config(temp_dir.path());
    config.ollama.max_concurrency = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidConcurrency(0))
    ));
}

#[test]
fn validate_rejects_overlap_not_smaller_than_chunk_size() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    config.chunking.chunk_size = 100;
    config.chunking.overlap = 100;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidOverlap(100, 100))
    ));
}

#[test]
fn validate_rejects_zero_chunk_size() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    config.chunking.chunk_size = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkSize(0))
    ));
}

#[test]
fn validate_rejects_bad_answer_settings() {
    let temp_dir = TempDir::new().unwrap();

    let mut config = test_config(temp_dir.path());
    config.answer.top_k = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidTopK(0))));

    let mut config = test_config(temp_dir.path());
    config.answer.max_context_chars = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidContextBudget(0))
    ));
}

#[test]
fn url_builds_from_parts() {
    let config = OllamaConfig::default();
    let url = config.url().unwrap();
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn stores_dir_is_under_base_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    assert_eq!(config.stores_dir(), temp_dir.path().join("stores"));
}
