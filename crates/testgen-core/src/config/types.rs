use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use testgen_rag::EmbeddingPolicy;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Free-form settings for integrations. The only table that accepts unknown keys.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, toml::Value>,
}

/// LLM provider backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenAi,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_model() -> String {
    "llama3.1:8b".into()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}

fn default_max_tokens() -> u32 {
    4096
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model", alias = "embedding_model_identifier")]
    pub embedding_model: String,
    /// Completion limit for the OpenAI-compatible backend.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Read from `TESTGEN_API_KEY` only, never from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            max_tokens: default_max_tokens(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_top_k() -> usize {
    5
}

fn default_ocr_max_pages() -> usize {
    87
}

fn default_ocr_dpi() -> u32 {
    100
}

fn default_max_file_size_mb() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RagConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_ocr_max_pages")]
    pub ocr_max_pages: usize,
    #[serde(default = "default_ocr_dpi")]
    pub ocr_dpi: u32,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default)]
    pub embedding_policy: EmbeddingPolicy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            ocr_max_pages: default_ocr_max_pages(),
            ocr_dpi: default_ocr_dpi(),
            max_file_size_mb: default_max_file_size_mb(),
            embedding_policy: EmbeddingPolicy::default(),
        }
    }
}

impl RagConfig {
    #[must_use]
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

fn default_true() -> bool {
    true
}

fn default_tesseract_command() -> String {
    "tesseract".into()
}

fn default_pdftoppm_command() -> String {
    "pdftoppm".into()
}

fn default_ocr_language() -> String {
    "eng".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OcrConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tesseract_command")]
    pub tesseract_command: String,
    #[serde(default = "default_pdftoppm_command")]
    pub pdftoppm_command: String,
    #[serde(default = "default_ocr_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tesseract_command: default_tesseract_command(),
            pdftoppm_command: default_pdftoppm_command(),
            language: default_ocr_language(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input_data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_examples_dir() -> PathBuf {
    PathBuf::from("input_data/java_tests")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory scanned for `*Test.java` example files.
    #[serde(default = "default_examples_dir")]
    pub examples_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            examples_dir: default_examples_dir(),
        }
    }
}

fn default_examples_limit() -> usize {
    3
}

fn default_doc_examples() -> usize {
    3
}

pub(crate) fn default_required_doc_tags() -> Vec<String> {
    vec!["@author".into(), "@version".into()]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    #[serde(default = "default_examples_limit")]
    pub examples_limit: usize,
    /// Chunks fetched to ground documentation-driven generation.
    #[serde(default = "default_doc_examples")]
    pub doc_examples: usize,
    #[serde(default = "default_required_doc_tags")]
    pub required_doc_tags: Vec<String>,
    /// Prompt template with `{context}` and `{question}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            examples_limit: default_examples_limit(),
            doc_examples: default_doc_examples(),
            required_doc_tags: default_required_doc_tags(),
            template: None,
        }
    }
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_embedding_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    #[serde(default = "default_llm_timeout")]
    pub llm_seconds: u64,
    #[serde(default = "default_embedding_timeout")]
    pub embedding_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            llm_seconds: default_llm_timeout(),
            embedding_seconds: default_embedding_timeout(),
        }
    }
}
