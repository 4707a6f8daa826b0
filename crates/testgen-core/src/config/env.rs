use std::path::PathBuf;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_rag();
        self.apply_env_overrides_paths();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("TESTGEN_LLM_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid TESTGEN_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("TESTGEN_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("TESTGEN_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("TESTGEN_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("TESTGEN_API_KEY")
            && !v.trim().is_empty()
        {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("TESTGEN_TIMEOUT_LLM") {
            match v.parse::<u64>() {
                Ok(secs) => self.timeouts.llm_seconds = secs,
                Err(_) => tracing::warn!("ignoring invalid TESTGEN_TIMEOUT_LLM value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("TESTGEN_TIMEOUT_EMBEDDING") {
            match v.parse::<u64>() {
                Ok(secs) => self.timeouts.embedding_seconds = secs,
                Err(_) => tracing::warn!("ignoring invalid TESTGEN_TIMEOUT_EMBEDDING value: {v}"),
            }
        }
    }

    fn apply_env_overrides_rag(&mut self) {
        if let Some(n) = env_usize("TESTGEN_CHUNK_SIZE") {
            self.rag.chunk_size = n;
        }
        if let Some(n) = env_usize("TESTGEN_CHUNK_OVERLAP") {
            self.rag.chunk_overlap = n;
        }
        if let Some(n) = env_usize("TESTGEN_TOP_K") {
            self.rag.top_k = n;
        }
        if let Some(n) = env_usize("TESTGEN_OCR_MAX_PAGES") {
            self.rag.ocr_max_pages = n;
        }
        if let Ok(v) = std::env::var("TESTGEN_MAX_FILE_SIZE_MB") {
            match v.parse::<u64>() {
                Ok(mb) => self.rag.max_file_size_mb = mb,
                Err(_) => tracing::warn!("ignoring invalid TESTGEN_MAX_FILE_SIZE_MB value: {v}"),
            }
        }
    }

    fn apply_env_overrides_paths(&mut self) {
        if let Ok(v) = std::env::var("TESTGEN_INPUT_DIR") {
            self.paths.input_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TESTGEN_OUTPUT_DIR") {
            self.paths.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TESTGEN_EXAMPLES_DIR") {
            self.paths.examples_dir = PathBuf::from(v);
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let v = std::env::var(key).ok()?;
    match v.parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {v}");
            None
        }
    }
}
