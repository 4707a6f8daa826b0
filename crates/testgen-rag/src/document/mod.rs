pub mod error;
pub mod languages;
pub mod loader;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
pub use languages::{Lang, detect_language};
#[cfg(feature = "pdf")]
pub use loader::PdfExtract;
pub use loader::{
    OcrBackend, OcrFallback, PageImage, PdfLoader, PdfRasterizer, PdfTextExtractor,
    PdftoppmRasterizer, SourceLoader, TesseractOcr, TextLoader, collect_files, needs_ocr,
};
pub use splitter::{RecursiveSplitter, SplitterConfig};
pub use types::{Chunk, Document, DocumentMetadata, SourceKind};

/// Default maximum file size: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        path: &std::path::Path,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>,
    >;
}
