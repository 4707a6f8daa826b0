//! Page rasterization and optical character recognition for PDFs without a text layer.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::super::DocumentError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A rendered PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-based page number.
    pub page: usize,
    /// Encoded image bytes (PNG for the bundled rasterizer).
    pub data: Vec<u8>,
}

/// Renders PDF pages to images.
pub trait PdfRasterizer: Send + Sync {
    /// Render pages `1..=max_pages` (or fewer, if the document is shorter) in page order.
    fn render_pages<'a>(
        &'a self,
        path: &'a Path,
        dpi: u32,
        max_pages: usize,
    ) -> BoxFuture<'a, Result<Vec<PageImage>, DocumentError>>;
}

/// Recognizes text in a page image.
pub trait OcrBackend: Send + Sync {
    fn recognize<'a>(&'a self, image: &'a PageImage) -> BoxFuture<'a, Result<String, DocumentError>>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    command: String,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdftoppmRasterizer {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl PdfRasterizer for PdftoppmRasterizer {
    fn render_pages<'a>(
        &'a self,
        path: &'a Path,
        dpi: u32,
        max_pages: usize,
    ) -> BoxFuture<'a, Result<Vec<PageImage>, DocumentError>> {
        Box::pin(async move {
            if max_pages == 0 {
                return Ok(Vec::new());
            }
            let dir = tempfile::tempdir()?;
            let prefix = dir.path().join("page");

            let output = Command::new(&self.command)
                .arg("-r")
                .arg(dpi.to_string())
                .arg("-png")
                .arg("-f")
                .arg("1")
                .arg("-l")
                .arg(max_pages.to_string())
                .arg(path)
                .arg(&prefix)
                .output()
                .await?;
            if !output.status.success() {
                return Err(DocumentError::Ocr(format!(
                    "{} exited with {}: {}",
                    self.command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }

            let mut rendered = Vec::new();
            let mut entries = tokio::fs::read_dir(dir.path()).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                if let Some(page) = name.to_str().and_then(page_number) {
                    rendered.push((page, entry.path()));
                }
            }
            rendered.sort_by_key(|(page, _)| *page);
            rendered.truncate(max_pages);

            let mut pages = Vec::with_capacity(rendered.len());
            for (page, file) in rendered {
                let data = tokio::fs::read(&file).await?;
                pages.push(PageImage { page, data });
            }
            tracing::debug!(path = %path.display(), pages = pages.len(), dpi, "rasterized PDF");
            Ok(pages)
        })
    }
}

/// Page number from a `pdftoppm` output name such as `page-7.png` or `page-007.png`.
fn page_number(file_name: &str) -> Option<usize> {
    let stem = file_name.strip_suffix(".png")?;
    let (_, digits) = stem.rsplit_once('-')?;
    digits.parse().ok()
}

/// OCR backend that pipes each image through the `tesseract` CLI.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
    language: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TesseractOcr {
    #[must_use]
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }
}

impl OcrBackend for TesseractOcr {
    fn recognize<'a>(&'a self, image: &'a PageImage) -> BoxFuture<'a, Result<String, DocumentError>> {
        Box::pin(async move {
            let mut child = Command::new(&self.command)
                .args(["stdin", "stdout", "-l", &self.language])
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(&image.data).await?;
            }

            let output = child.wait_with_output().await?;
            if !output.status.success() {
                return Err(DocumentError::Ocr(format!(
                    "{} failed on page {}: {}",
                    self.command,
                    image.page,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
    }
}
