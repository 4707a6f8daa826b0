//! Document ingestion, chunking, vector index and retrieval-augmented generation.

pub mod document;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

#[cfg(feature = "pdf")]
pub use document::PdfExtract;
pub use document::{
    Chunk, Document, DocumentError, DocumentMetadata, Lang, OcrBackend, OcrFallback, PageImage,
    PdfLoader, PdfRasterizer, PdfTextExtractor, PdftoppmRasterizer, RecursiveSplitter,
    SourceKind, SourceLoader, SplitterConfig, TesseractOcr, TextLoader,
};
pub use error::RagError;
pub use index::{BuildReport, EmbeddingPolicy, IndexBuilder, ScoredChunk, VectorIndex};
pub use pipeline::{GenerationResult, IngestReport, PipelineState, RagPipeline, RagSettings};
pub use prompt::PromptTemplate;
pub use retriever::Retriever;
