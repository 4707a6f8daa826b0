//! Ingestion and retrieval-augmented generation over a swappable index snapshot.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use testgen_llm::{EmbedFn, LlmError, LlmProvider};

use crate::document::{Chunk, Document, RecursiveSplitter, SourceLoader, SplitterConfig};
use crate::error::{RagError, Result};
use crate::index::{EmbeddingPolicy, IndexBuilder, ScoredChunk, VectorIndex};
use crate::prompt::{PromptTemplate, format_context};
use crate::retriever::Retriever;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks retrieved per generation request.
    pub top_k: usize,
    pub embedding_policy: EmbeddingPolicy,
    pub llm_timeout: Duration,
    pub embedding_timeout: Duration,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            top_k: 5,
            embedding_policy: EmbeddingPolicy::Abort,
            llm_timeout: Duration::from_secs(120),
            embedding_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Indexed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub answer: String,
    /// Chunks placed in the prompt, in prompt order.
    pub context: Vec<Chunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub units: usize,
    pub chunks: usize,
    pub indexed: usize,
    pub skipped: usize,
}

/// Retrieval-augmented generation pipeline.
///
/// Holds at most one index snapshot. Builds are serialized; readers clone the
/// current `Arc` and never observe a partially built index. A failed build keeps
/// the previous snapshot.
pub struct RagPipeline<P: LlmProvider> {
    provider: Arc<P>,
    loader: SourceLoader,
    splitter: RecursiveSplitter,
    builder: IndexBuilder,
    retriever: Retriever,
    template: PromptTemplate,
    top_k: usize,
    llm_timeout: Duration,
    index: RwLock<Option<Arc<VectorIndex>>>,
    build_lock: tokio::sync::Mutex<()>,
}

impl<P: LlmProvider> RagPipeline<P> {
    /// # Errors
    ///
    /// Returns [`RagError::Config`] for invalid chunking parameters or a zero `top_k`.
    pub fn new(provider: Arc<P>, embed: EmbedFn, settings: RagSettings) -> Result<Self> {
        if settings.top_k == 0 {
            return Err(RagError::Config("top_k must be at least 1".into()));
        }
        let splitter = RecursiveSplitter::new(SplitterConfig {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        })?;

        Ok(Self {
            provider,
            loader: SourceLoader::default(),
            splitter,
            builder: IndexBuilder::new(Arc::clone(&embed))
                .with_policy(settings.embedding_policy)
                .with_timeout(settings.embedding_timeout),
            retriever: Retriever::new(embed).with_timeout(settings.embedding_timeout),
            template: PromptTemplate::default(),
            top_k: settings.top_k,
            llm_timeout: settings.llm_timeout,
            index: RwLock::new(None),
            build_lock: tokio::sync::Mutex::new(()),
        })
    }

    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: SourceLoader) -> Self {
        self.loader = loader;
        self
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[must_use]
    pub fn state(&self) -> PipelineState {
        if self.snapshot().is_some() {
            PipelineState::Indexed
        } else {
            PipelineState::Uninitialized
        }
    }

    /// Current index snapshot, if one has been built.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<VectorIndex>> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, index: VectorIndex) {
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(index));
    }

    /// Load `paths` and rebuild the index from their content.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Ingestion`] when nothing usable was loaded, plus any
    /// error from [`RagPipeline::rebuild`].
    pub async fn ingest(&self, paths: &[PathBuf]) -> Result<IngestReport> {
        let units = self.loader.load_all(paths).await?;
        self.rebuild(units).await
    }

    /// Split, embed and publish a new index built from `units`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Ingestion`] if no chunk was produced, or
    /// [`RagError::Embedding`] per the configured [`EmbeddingPolicy`].
    pub async fn rebuild(&self, units: Vec<Document>) -> Result<IngestReport> {
        let _guard = self.build_lock.lock().await;

        let chunks = self.splitter.split_all(&units);
        let chunk_count = chunks.len();
        let (index, build) = self.builder.build(chunks).await?;
        self.publish(index);

        let report = IngestReport {
            units: units.len(),
            chunks: chunk_count,
            indexed: build.indexed,
            skipped: build.skipped,
        };
        tracing::info!(
            units = report.units,
            chunks = report.chunks,
            indexed = report.indexed,
            skipped = report.skipped,
            "index rebuilt"
        );
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns [`RagError::NotReady`] before the first build, [`RagError::InvalidArgument`]
    /// for `k == 0`, or [`RagError::Embedding`] if the query cannot be embedded.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let index = self.snapshot().ok_or(RagError::NotReady)?;
        self.retriever.search(&index, query, k).await
    }

    /// Retrieve `top_k` chunks for `request` and answer from them.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotReady`] before the first build, [`RagError::Embedding`]
    /// if the request cannot be embedded, or [`RagError::Generation`].
    pub async fn generate(&self, request: &str) -> Result<GenerationResult> {
        self.generate_with_prefix(request, None).await
    }

    /// Like [`RagPipeline::generate`], with `prefix` placed before the retrieved chunks.
    ///
    /// # Errors
    ///
    /// See [`RagPipeline::generate`].
    pub async fn generate_with_prefix(
        &self,
        request: &str,
        prefix: Option<&str>,
    ) -> Result<GenerationResult> {
        let hits = self.search(request, self.top_k).await?;
        let context = hits.into_iter().map(|h| h.chunk).collect();
        self.generate_from_context(request, context, prefix).await
    }

    /// Render the prompt from caller-supplied context and call the backend once.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Generation`] if the backend fails, times out, or answers
    /// with blank text.
    pub async fn generate_from_context(
        &self,
        request: &str,
        context: Vec<Chunk>,
        prefix: Option<&str>,
    ) -> Result<GenerationResult> {
        let prompt = self.template.render(&format_context(&context, prefix), request);
        tracing::debug!(
            context_chunks = context.len(),
            prompt_len = prompt.len(),
            "generating"
        );

        let failed = |source| RagError::Generation {
            request: request.to_owned(),
            source,
        };

        let answer = tokio::time::timeout(self.llm_timeout, self.provider.complete(&prompt))
            .await
            .map_err(|_| failed(LlmError::Timeout(self.llm_timeout)))?
            .map_err(failed)?;

        if answer.trim().is_empty() {
            return Err(failed(LlmError::EmptyResponse {
                provider: self.provider.name().to_owned(),
            }));
        }

        Ok(GenerationResult { answer, context })
    }
}
