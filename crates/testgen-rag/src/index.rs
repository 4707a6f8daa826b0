//! Immutable in-memory vector index and its builder.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use testgen_llm::{EmbedFn, LlmError};

use crate::document::Chunk;
use crate::error::{RagError, Result};

pub const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when a single chunk cannot be embedded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingPolicy {
    /// Fail the whole build on the first error.
    #[default]
    Abort,
    /// Log the failure and leave the chunk out of the index.
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub indexed: usize,
    pub skipped: usize,
    pub dimension: usize,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
    /// Insertion position of the entry in the index.
    pub position: usize,
}

/// Snapshot of embedded chunks in insertion order. All vectors share one dimension.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: usize,
}

impl VectorIndex {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Exhaustive cosine ranking: score descending, ties by insertion order.
    ///
    /// Returns at most `k` hits; all entries when `k` exceeds the index size.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `k` is zero.
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be at least 1".into()));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| ScoredChunk {
                chunk: self.entries[position].chunk.clone(),
                score,
                position,
            })
            .collect())
    }
}

/// Zero when either vector has zero norm or the lengths differ.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embeds chunks sequentially and assembles a [`VectorIndex`].
pub struct IndexBuilder {
    embed: EmbedFn,
    policy: EmbeddingPolicy,
    timeout: Duration,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(embed: EmbedFn) -> Self {
        Self {
            embed,
            policy: EmbeddingPolicy::default(),
            timeout: DEFAULT_EMBEDDING_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: EmbeddingPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Embed every chunk in order.
    ///
    /// # Errors
    ///
    /// - [`RagError::Ingestion`] if `chunks` is empty.
    /// - [`RagError::Embedding`] on the first failure under [`EmbeddingPolicy::Abort`],
    ///   or when every chunk failed under [`EmbeddingPolicy::Skip`]. `chunk_index` is the
    ///   position of the failing chunk in `chunks`.
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<(VectorIndex, BuildReport)> {
        if chunks.is_empty() {
            return Err(RagError::Ingestion("no chunks to index".into()));
        }

        let mut entries: Vec<IndexEntry> = Vec::with_capacity(chunks.len());
        let mut dimension: Option<usize> = None;
        let mut skipped = 0;
        let mut last_failure = None;

        for (i, chunk) in chunks.into_iter().enumerate() {
            match embed_checked(&self.embed, self.timeout, &chunk.content, dimension).await {
                Ok(vector) => {
                    dimension.get_or_insert(vector.len());
                    entries.push(IndexEntry { chunk, vector });
                }
                Err(source) => match self.policy {
                    EmbeddingPolicy::Abort => {
                        return Err(RagError::Embedding {
                            chunk_index: Some(i),
                            source,
                        });
                    }
                    EmbeddingPolicy::Skip => {
                        tracing::warn!(
                            chunk = i,
                            source = %chunk.metadata.source,
                            error = %source,
                            "skipping chunk that failed to embed"
                        );
                        skipped += 1;
                        last_failure = Some((i, source));
                    }
                },
            }
        }

        if entries.is_empty()
            && let Some((chunk_index, source)) = last_failure
        {
            return Err(RagError::Embedding {
                chunk_index: Some(chunk_index),
                source,
            });
        }

        let dimension = dimension.unwrap_or_default();
        let report = BuildReport {
            indexed: entries.len(),
            skipped,
            dimension,
        };
        tracing::debug!(indexed = report.indexed, skipped, dimension, "index built");
        Ok((VectorIndex { entries, dimension }, report))
    }
}

/// One embedding call bounded by `timeout`. Empty vectors and vectors whose length
/// differs from `expected` count as failures.
pub(crate) async fn embed_checked(
    embed: &EmbedFn,
    timeout: Duration,
    text: &str,
    expected: Option<usize>,
) -> std::result::Result<Vec<f32>, LlmError> {
    let vector = tokio::time::timeout(timeout, embed(text))
        .await
        .map_err(|_| LlmError::Timeout(timeout))??;

    if vector.is_empty() {
        return Err(LlmError::Other("embedding backend returned an empty vector".into()));
    }
    if let Some(dim) = expected
        && vector.len() != dim
    {
        return Err(LlmError::Other(format!(
            "embedding dimension mismatch: expected {dim}, got {}",
            vector.len()
        )));
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use testgen_llm::EmbedFuture;

    use super::*;
    use crate::document::{DocumentMetadata, SourceKind};

    fn chunk(content: &str) -> Chunk {
        Chunk {
            content: content.to_owned(),
            metadata: DocumentMetadata::new("test.txt", SourceKind::PlainText),
            chunk_index: 0,
        }
    }

    /// Embeds "a" as [1,0], "b" as [0,1], "ab" as [1,1]; "fail" errors; "short" is 1-d.
    fn table_embed() -> EmbedFn {
        Arc::new(|text: &str| -> EmbedFuture {
            let result = match text {
                "a" => Ok(vec![1.0, 0.0]),
                "b" => Ok(vec![0.0, 1.0]),
                "ab" => Ok(vec![1.0, 1.0]),
                "zero" => Ok(vec![0.0, 0.0]),
                "short" => Ok(vec![1.0]),
                "empty" => Ok(Vec::new()),
                _ => Err(LlmError::Other(format!("cannot embed {text}"))),
            };
            Box::pin(async move { result })
        })
    }

    #[tokio::test]
    async fn build_keeps_input_order() {
        let (index, report) = IndexBuilder::new(table_embed())
            .build(vec![chunk("a"), chunk("b"), chunk("ab")])
            .await
            .unwrap();
        assert_eq!(report.indexed, 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(index.dimension(), 2);
        let contents: Vec<&str> = index.chunks().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "ab"]);
    }

    #[tokio::test]
    async fn empty_chunk_set_is_ingestion_error() {
        let err = IndexBuilder::new(table_embed()).build(Vec::new()).await.unwrap_err();
        assert!(matches!(err, RagError::Ingestion(_)));
    }

    #[tokio::test]
    async fn abort_policy_reports_failing_position() {
        let err = IndexBuilder::new(table_embed())
            .build(vec![chunk("a"), chunk("fail"), chunk("b")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::Embedding {
                chunk_index: Some(1),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn skip_policy_excludes_failures() {
        let (index, report) = IndexBuilder::new(table_embed())
            .with_policy(EmbeddingPolicy::Skip)
            .build(vec![chunk("a"), chunk("fail"), chunk("short"), chunk("empty"), chunk("b")])
            .await
            .unwrap();
        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, 3);
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn skip_policy_with_every_chunk_failing_is_embedding_error() {
        let err = IndexBuilder::new(table_embed())
            .with_policy(EmbeddingPolicy::Skip)
            .build(vec![chunk("fail"), chunk("nope")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::Embedding {
                chunk_index: Some(1),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn dimension_mismatch_aborts() {
        let err = IndexBuilder::new(table_embed())
            .build(vec![chunk("a"), chunk("short")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"), "{err}");
    }

    #[tokio::test]
    async fn slow_embedding_times_out() {
        let embed: EmbedFn = Arc::new(|_text: &str| -> EmbedFuture {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(vec![1.0])
            })
        });
        let err = IndexBuilder::new(embed)
            .with_timeout(Duration::from_millis(20))
            .build(vec![chunk("a")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::Embedding {
                source: LlmError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn embedding_is_sequential_one_call_per_chunk() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let embed: EmbedFn = Arc::new(move |_text: &str| -> EmbedFuture {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(vec![1.0, 2.0]) })
        });
        IndexBuilder::new(embed)
            .build(vec![chunk("x"), chunk("y"), chunk("z")])
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_and_breaks_ties_by_position() {
        let (index, _) = IndexBuilder::new(table_embed())
            .build(vec![chunk("b"), chunk("a"), chunk("ab"), chunk("a")])
            .await
            .unwrap();
        let hits = index.search_by_vector(&[1.0, 0.0], 4).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![1, 3, 2, 0]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_with_large_k_returns_all() {
        let (index, _) = IndexBuilder::new(table_embed())
            .build(vec![chunk("a"), chunk("b")])
            .await
            .unwrap();
        assert_eq!(index.search_by_vector(&[1.0, 1.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn search_with_zero_k_is_invalid() {
        let err = VectorIndex::default().search_by_vector(&[1.0], 0).unwrap_err();
        assert!(matches!(err, RagError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn zero_norm_entry_scores_zero() {
        let (index, _) = IndexBuilder::new(table_embed())
            .build(vec![chunk("zero"), chunk("a")])
            .await
            .unwrap();
        let hits = index.search_by_vector(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[1].position, 0);
        assert!(hits[1].score.abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_similarity_identical() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_similarity_length_mismatch_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[1.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn embedding_policy_serde() {
        let policy: EmbeddingPolicy = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(policy, EmbeddingPolicy::Skip);
        assert_eq!(EmbeddingPolicy::default(), EmbeddingPolicy::Abort);
    }

    mod proptest_ranking {
        use proptest::prelude::*;

        use super::*;

        fn vectors() -> impl Strategy<Value = Vec<Vec<f32>>> {
            prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 3), 1..20)
        }

        proptest! {
            #[test]
            fn results_sorted_and_bounded(
                entries in vectors(),
                query in prop::collection::vec(-10.0f32..10.0, 3),
                k in 1usize..30,
            ) {
                let index = VectorIndex {
                    dimension: 3,
                    entries: entries
                        .iter()
                        .map(|v| IndexEntry { chunk: chunk("x"), vector: v.clone() })
                        .collect(),
                };
                let hits = index.search_by_vector(&query, k).unwrap();
                prop_assert_eq!(hits.len(), k.min(entries.len()));
                for pair in hits.windows(2) {
                    prop_assert!(pair[0].score >= pair[1].score);
                    if pair[0].score.total_cmp(&pair[1].score).is_eq() {
                        prop_assert!(pair[0].position < pair[1].position);
                    }
                }
            }

            #[test]
            fn cosine_is_bounded(
                a in prop::collection::vec(-100.0f32..100.0, 4),
                b in prop::collection::vec(-100.0f32..100.0, 4),
            ) {
                let s = cosine_similarity(&a, &b);
                prop_assert!((-1.0 - 1e-4..=1.0 + 1e-4).contains(&s));
            }
        }
    }
}
