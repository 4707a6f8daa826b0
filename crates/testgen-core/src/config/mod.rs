mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use testgen_rag::{PromptTemplate, RagSettings};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, including
    /// unknown keys outside `[extensions]`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject values no pipeline can run with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        let rag = &self.rag;
        if rag.chunk_size == 0 {
            bail!("rag.chunk_size must be greater than 0");
        }
        if rag.chunk_overlap >= rag.chunk_size {
            bail!(
                "rag.chunk_overlap ({}) must be less than rag.chunk_size ({})",
                rag.chunk_overlap,
                rag.chunk_size
            );
        }
        if rag.top_k == 0 {
            bail!("rag.top_k must be greater than 0");
        }
        if rag.ocr_max_pages == 0 {
            bail!("rag.ocr_max_pages must be greater than 0");
        }
        if rag.ocr_dpi == 0 {
            bail!("rag.ocr_dpi must be greater than 0");
        }
        if self.timeouts.llm_seconds == 0 {
            bail!("timeouts.llm_seconds must be greater than 0");
        }
        if self.timeouts.embedding_seconds == 0 {
            bail!("timeouts.embedding_seconds must be greater than 0");
        }
        if self.generation.doc_examples == 0 {
            bail!("generation.doc_examples must be greater than 0");
        }
        self.prompt_template()
            .context("invalid generation.template")?;
        if self.llm.provider == ProviderKind::OpenAi && self.llm.api_key.is_none() {
            bail!("llm.provider = \"openai\" requires TESTGEN_API_KEY");
        }
        Ok(())
    }

    #[must_use]
    pub fn rag_settings(&self) -> RagSettings {
        RagSettings {
            chunk_size: self.rag.chunk_size,
            chunk_overlap: self.rag.chunk_overlap,
            top_k: self.rag.top_k,
            embedding_policy: self.rag.embedding_policy,
            llm_timeout: Duration::from_secs(self.timeouts.llm_seconds),
            embedding_timeout: Duration::from_secs(self.timeouts.embedding_seconds),
        }
    }

    /// The configured template, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured template lacks a placeholder.
    pub fn prompt_template(&self) -> Result<PromptTemplate, testgen_rag::RagError> {
        match &self.generation.template {
            Some(template) => PromptTemplate::new(template.as_str()),
            None => Ok(PromptTemplate::default()),
        }
    }
}
