//! Error types for testgen-rag.

use testgen_llm::LlmError;

/// Errors surfaced by the ingestion and generation pipeline.
///
/// Each kind is distinct so callers can tell "nothing was ingested" apart from
/// "the backend is down".
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// No usable document content remained after loading or splitting.
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// Vectorization failed for a chunk (`None` for query embeddings).
    #[error("embedding failed{}: {source}", chunk_suffix(.chunk_index))]
    Embedding {
        chunk_index: Option<usize>,
        #[source]
        source: LlmError,
    },

    /// An operation needs a built index and none exists yet.
    #[error("index not built yet; ingest documents first")]
    NotReady,

    /// The generation backend failed or returned unusable output.
    #[error("generation failed for request {request:?}: {source}")]
    Generation {
        request: String,
        #[source]
        source: LlmError,
    },

    /// Invalid pipeline configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Invalid argument to a pipeline operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[allow(clippy::ref_option)]
fn chunk_suffix(chunk_index: &Option<usize>) -> String {
    chunk_index.map(|i| format!(" for chunk {i}")).unwrap_or_default()
}

/// Result type alias using `RagError`.
pub type Result<T> = std::result::Result<T, RagError>;
