use std::fmt;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata, SourceKind,
};
use super::ocr::{OcrBackend, PdfRasterizer};

pub const DEFAULT_OCR_DPI: u32 = 100;
pub const DEFAULT_OCR_MAX_PAGES: usize = 87;

/// Direct text extraction from a PDF text layer. Runs on the blocking pool.
pub trait PdfTextExtractor: Send + Sync {
    /// Text of every page, in page order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Pdf`] if the file cannot be parsed.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, DocumentError>;
}

#[cfg(feature = "pdf")]
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtract;

#[cfg(feature = "pdf")]
impl PdfTextExtractor for PdfExtract {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, DocumentError> {
        pdf_extract::extract_text_by_pages(path).map_err(|e| DocumentError::Pdf(e.to_string()))
    }
}

/// True when direct extraction found no text at all.
#[must_use]
pub fn needs_ocr(pages: &[String]) -> bool {
    pages.iter().all(|p| p.trim().is_empty())
}

/// Rasterize-then-recognize path for scanned PDFs.
#[derive(Clone)]
pub struct OcrFallback {
    pub rasterizer: Arc<dyn PdfRasterizer>,
    pub ocr: Arc<dyn OcrBackend>,
    pub dpi: u32,
    /// Pages past this limit are never recognized.
    pub max_pages: usize,
}

impl fmt::Debug for OcrFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrFallback")
            .field("dpi", &self.dpi)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

impl OcrFallback {
    #[must_use]
    pub fn new(rasterizer: Arc<dyn PdfRasterizer>, ocr: Arc<dyn OcrBackend>) -> Self {
        Self {
            rasterizer,
            ocr,
            dpi: DEFAULT_OCR_DPI,
            max_pages: DEFAULT_OCR_MAX_PAGES,
        }
    }

    #[must_use]
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    async fn recognize(&self, path: &Path) -> Result<String, DocumentError> {
        let images = self
            .rasterizer
            .render_pages(path, self.dpi, self.max_pages)
            .await?;

        let mut texts = Vec::with_capacity(images.len().min(self.max_pages));
        for image in images.iter().take(self.max_pages) {
            match self.ocr.recognize(image).await {
                Ok(text) => texts.push(text),
                Err(e) => {
                    tracing::warn!(page = image.page, error = %e, "OCR failed for page");
                    texts.push(String::new());
                }
            }
        }
        Ok(texts.join("\n"))
    }
}

/// Loads PDFs page by page, falling back to OCR when there is no text layer.
pub struct PdfLoader {
    pub max_file_size: u64,
    extractor: Arc<dyn PdfTextExtractor>,
    ocr: Option<OcrFallback>,
}

#[cfg(feature = "pdf")]
impl Default for PdfLoader {
    fn default() -> Self {
        Self::new(Arc::new(PdfExtract))
    }
}

impl PdfLoader {
    #[must_use]
    pub fn new(extractor: Arc<dyn PdfTextExtractor>) -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            extractor,
            ocr: None,
        }
    }

    #[must_use]
    pub fn with_ocr(mut self, ocr: OcrFallback) -> Self {
        self.ocr = Some(ocr);
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = tokio::fs::canonicalize(&path).await?;

            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let source = path.display().to_string();
            let extractor = Arc::clone(&self.extractor);
            let path_buf = path.clone();
            let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&path_buf))
                .await
                .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

            if !needs_ocr(&pages) {
                return Ok(pages
                    .into_iter()
                    .enumerate()
                    .filter(|(_, text)| !text.trim().is_empty())
                    .map(|(i, content)| {
                        let mut metadata = DocumentMetadata::new(source.clone(), SourceKind::Pdf);
                        metadata.page = Some(i + 1);
                        Document { content, metadata }
                    })
                    .collect());
            }

            let Some(fallback) = &self.ocr else {
                tracing::warn!(path = %source, "PDF has no text layer and OCR is not configured");
                return Ok(Vec::new());
            };

            tracing::info!(path = %source, max_pages = fallback.max_pages, "no text layer, running OCR");
            let content = fallback.recognize(&path).await?;
            let mut metadata = DocumentMetadata::new(source, SourceKind::Pdf);
            metadata
                .extra
                .insert("extraction".to_owned(), "ocr".to_owned());
            Ok(vec![Document { content, metadata }])
        })
    }
}
