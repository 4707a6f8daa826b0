//! Query embedding plus exhaustive similarity search over a [`VectorIndex`].

use std::time::Duration;

use testgen_llm::EmbedFn;

use crate::error::{RagError, Result};
use crate::index::{DEFAULT_EMBEDDING_TIMEOUT, ScoredChunk, VectorIndex, embed_checked};

pub struct Retriever {
    embed: EmbedFn,
    timeout: Duration,
}

impl Retriever {
    #[must_use]
    pub fn new(embed: EmbedFn) -> Self {
        Self {
            embed,
            timeout: DEFAULT_EMBEDDING_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Top-`k` chunks for `query`, most similar first.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] if `k` is zero. Checked before any backend call.
    /// - [`RagError::Embedding`] if the query cannot be embedded or its dimension does
    ///   not match the index.
    pub async fn search(
        &self,
        index: &VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be at least 1".into()));
        }

        let expected = (index.dimension() > 0).then_some(index.dimension());
        let vector = embed_checked(&self.embed, self.timeout, query, expected)
            .await
            .map_err(|source| RagError::Embedding {
                chunk_index: None,
                source,
            })?;

        let hits = index.search_by_vector(&vector, k)?;
        tracing::debug!(k, hits = hits.len(), "retrieved context");
        Ok(hits)
    }
}
