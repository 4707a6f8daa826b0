use std::io::Write;
use std::path::PathBuf;

use serial_test::serial;
use testgen_rag::EmbeddingPolicy;

use super::*;

const ENV_KEYS: [&str; 15] = [
    "TESTGEN_LLM_PROVIDER",
    "TESTGEN_LLM_BASE_URL",
    "TESTGEN_LLM_MODEL",
    "TESTGEN_LLM_EMBEDDING_MODEL",
    "TESTGEN_API_KEY",
    "TESTGEN_CHUNK_SIZE",
    "TESTGEN_CHUNK_OVERLAP",
    "TESTGEN_TOP_K",
    "TESTGEN_OCR_MAX_PAGES",
    "TESTGEN_MAX_FILE_SIZE_MB",
    "TESTGEN_INPUT_DIR",
    "TESTGEN_OUTPUT_DIR",
    "TESTGEN_EXAMPLES_DIR",
    "TESTGEN_TIMEOUT_LLM",
    "TESTGEN_TIMEOUT_EMBEDDING",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("testgen.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{content}").unwrap();
    (dir, path)
}

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.llm.base_url, "http://localhost:11434");
    assert_eq!(config.rag.chunk_size, 500);
    assert_eq!(config.rag.chunk_overlap, 100);
    assert_eq!(config.rag.top_k, 5);
    assert_eq!(config.rag.ocr_max_pages, 87);
    assert_eq!(config.rag.ocr_dpi, 100);
    assert_eq!(config.rag.max_file_size_bytes(), 10 * 1024 * 1024);
    assert_eq!(config.rag.embedding_policy, EmbeddingPolicy::Abort);
    assert_eq!(config.paths.examples_dir, PathBuf::from("input_data/java_tests"));
    assert_eq!(config.generation.examples_limit, 3);
    assert_eq!(config.generation.doc_examples, 3);
    assert_eq!(config.generation.required_doc_tags, vec!["@author", "@version"]);
    assert_eq!(config.timeouts.llm_seconds, 120);
    assert_eq!(config.timeouts.embedding_seconds, 30);
    assert!(config.ocr.enabled);
    assert!(config.extensions.is_empty());
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/testgen.toml")).unwrap();
    assert_eq!(config.rag.chunk_size, 500);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn parse_valid_toml() {
    clear_env();
    let (_dir, path) = write_config(
        r#"
[llm]
provider = "ollama"
base_url = "http://custom:1234"
model = "codellama:13b"
embedding_model_identifier = "mxbai-embed-large"

[rag]
chunk_size = 800
chunk_overlap = 80
embedding_policy = "skip"

[paths]
output_dir = "build/generated"

[generation]
required_doc_tags = ["@author"]

[timeouts]
llm_seconds = 60
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.base_url, "http://custom:1234");
    assert_eq!(config.llm.model, "codellama:13b");
    assert_eq!(config.llm.embedding_model, "mxbai-embed-large");
    assert_eq!(config.rag.chunk_size, 800);
    assert_eq!(config.rag.chunk_overlap, 80);
    assert_eq!(config.rag.top_k, 5);
    assert_eq!(config.rag.embedding_policy, EmbeddingPolicy::Skip);
    assert_eq!(config.paths.output_dir, PathBuf::from("build/generated"));
    assert_eq!(config.generation.required_doc_tags, vec!["@author"]);
    assert_eq!(config.timeouts.llm_seconds, 60);
    assert_eq!(config.timeouts.embedding_seconds, 30);
}

#[test]
#[serial]
fn unknown_keys_are_rejected() {
    clear_env();
    let (_dir, path) = write_config("[rag]\nchunk_sise = 10\n");
    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("chunk_sise"), "{err:#}");
}

#[test]
#[serial]
fn unknown_top_level_section_is_rejected() {
    clear_env();
    let (_dir, path) = write_config("[gigachat]\ncredentials = \"x\"\n");
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn extensions_accept_free_form_keys() {
    clear_env();
    let (_dir, path) = write_config(
        r#"
[extensions]
team = "qa"
retries = 3

[extensions.reporting]
format = "junit-xml"
"#,
    );
    let config = Config::load(&path).unwrap();
    assert_eq!(config.extensions["team"].as_str(), Some("qa"));
    assert_eq!(config.extensions["retries"].as_integer(), Some(3));
    assert!(config.extensions["reporting"].is_table());
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("TESTGEN_LLM_PROVIDER", "openai");
        std::env::set_var("TESTGEN_LLM_MODEL", "gpt-4o-mini");
        std::env::set_var("TESTGEN_API_KEY", "sk-test");
        std::env::set_var("TESTGEN_CHUNK_SIZE", "300");
        std::env::set_var("TESTGEN_CHUNK_OVERLAP", "30");
        std::env::set_var("TESTGEN_TOP_K", "7");
        std::env::set_var("TESTGEN_OCR_MAX_PAGES", "10");
        std::env::set_var("TESTGEN_MAX_FILE_SIZE_MB", "2");
        std::env::set_var("TESTGEN_EXAMPLES_DIR", "/srv/examples");
        std::env::set_var("TESTGEN_TIMEOUT_LLM", "15");
        std::env::set_var("TESTGEN_TIMEOUT_EMBEDDING", "5");
    };
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.rag.chunk_size, 300);
    assert_eq!(config.rag.chunk_overlap, 30);
    assert_eq!(config.rag.top_k, 7);
    assert_eq!(config.rag.ocr_max_pages, 10);
    assert_eq!(config.rag.max_file_size_mb, 2);
    assert_eq!(config.paths.examples_dir, PathBuf::from("/srv/examples"));
    assert_eq!(config.timeouts.llm_seconds, 15);
    assert_eq!(config.timeouts.embedding_seconds, 5);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn invalid_env_numbers_are_ignored() {
    clear_env();
    let mut config = Config::default();
    unsafe {
        std::env::set_var("TESTGEN_CHUNK_SIZE", "lots");
        std::env::set_var("TESTGEN_LLM_PROVIDER", "gigachat");
        std::env::set_var("TESTGEN_TIMEOUT_LLM", "-1");
    };
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.rag.chunk_size, 500);
    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.timeouts.llm_seconds, 120);
}

#[test]
fn validate_rejects_overlap_not_below_size() {
    let mut config = Config::default();
    config.rag.chunk_overlap = config.rag.chunk_size;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));
}

#[test]
fn validate_rejects_zero_values() {
    let mut config = Config::default();
    config.rag.top_k = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.rag.chunk_size = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.rag.ocr_max_pages = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.rag.ocr_dpi = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_zero_timeouts() {
    let mut config = Config::default();
    config.timeouts.llm_seconds = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("timeouts.llm_seconds"));

    let mut config = Config::default();
    config.timeouts.embedding_seconds = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("timeouts.embedding_seconds"));
}

#[test]
fn validate_rejects_template_without_placeholders() {
    let mut config = Config::default();
    config.generation.template = Some("Answer: {question}".into());
    let err = config.validate().unwrap_err();
    assert!(format!("{err:#}").contains("{context}"));
}

#[test]
fn validate_requires_api_key_for_openai() {
    let mut config = Config::default();
    config.llm.provider = ProviderKind::OpenAi;
    assert!(config.validate().is_err());
    config.llm.api_key = Some("sk-test".into());
    assert!(config.validate().is_ok());
}

#[test]
fn api_key_is_redacted_in_debug() {
    let mut config = Config::default();
    config.llm.api_key = Some("sk-very-secret".into());
    let dbg = format!("{:?}", config.llm);
    assert!(!dbg.contains("sk-very-secret"));
    assert!(dbg.contains("<redacted>"));
}

#[test]
fn rag_settings_carry_timeouts() {
    let mut config = Config::default();
    config.timeouts.llm_seconds = 9;
    let settings = config.rag_settings();
    assert_eq!(settings.llm_timeout, Duration::from_secs(9));
    assert_eq!(settings.embedding_timeout, Duration::from_secs(30));
    assert_eq!(settings.top_k, 5);
}

#[test]
fn provider_kind_display() {
    assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
    assert_eq!(ProviderKind::Ollama.as_str(), "ollama");
}
