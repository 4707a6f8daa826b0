mod ocr;
mod pdf;
mod text;

use std::path::{Path, PathBuf};

pub use ocr::{BoxFuture, OcrBackend, PageImage, PdfRasterizer, PdftoppmRasterizer, TesseractOcr};
#[cfg(feature = "pdf")]
pub use pdf::PdfExtract;
pub use pdf::{
    DEFAULT_OCR_DPI, DEFAULT_OCR_MAX_PAGES, OcrFallback, PdfLoader, PdfTextExtractor, needs_ocr,
};
pub use text::TextLoader;

use super::{Document, DocumentError, DocumentLoader};
use crate::error::RagError;

/// Loads a batch of paths into text units, dispatching on file type.
///
/// `.pdf` files go to the PDF loader; every other file is read as UTF-8 text.
///
/// Failures are per file: a file that cannot be read is logged and skipped.
pub struct SourceLoader {
    text: TextLoader,
    pdf: Option<PdfLoader>,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self {
            text: TextLoader::default(),
            #[cfg(feature = "pdf")]
            pdf: Some(PdfLoader::default()),
            #[cfg(not(feature = "pdf"))]
            pdf: None,
        }
    }
}

impl SourceLoader {
    #[must_use]
    pub fn new(text: TextLoader, pdf: Option<PdfLoader>) -> Self {
        Self { text, pdf }
    }

    #[must_use]
    pub fn with_pdf(mut self, pdf: PdfLoader) -> Self {
        self.pdf = Some(pdf);
        self
    }

    /// Load one file with the loader matching its extension.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the file cannot be read or decoded, or if it is a PDF
    /// and no PDF loader is configured.
    pub async fn load_file(&self, path: &Path) -> Result<Vec<Document>, DocumentError> {
        if is_pdf(path) {
            let Some(pdf) = &self.pdf else {
                return Err(DocumentError::UnsupportedFormat(
                    "PDF support is not enabled".into(),
                ));
            };
            return pdf.load(path).await;
        }
        self.text.load(path).await
    }

    /// Load every file under `paths`, expanding directories.
    ///
    /// Blank units are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Ingestion`] if no non-blank unit remains.
    pub async fn load_all(&self, paths: &[PathBuf]) -> Result<Vec<Document>, RagError> {
        let files = collect_files(paths);
        let mut units = Vec::new();

        for file in &files {
            match self.load_file(file).await {
                Ok(docs) => units.extend(docs.into_iter().filter(|d| !d.content.trim().is_empty())),
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "skipping document");
                }
            }
        }

        if units.is_empty() {
            return Err(RagError::Ingestion(format!(
                "no usable content in {} file(s)",
                files.len()
            )));
        }

        tracing::info!(files = files.len(), units = units.len(), "documents loaded");
        Ok(units)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Expand directories into their files, skipping hidden and ignored entries.
///
/// Files inside one directory are sorted by path. Plain file arguments keep their
/// position.
#[must_use]
pub fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = ignore::WalkBuilder::new(path)
                .hidden(true)
                .git_ignore(true)
                .build()
                .flatten()
                .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
                .map(ignore::DirEntry::into_path)
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Lang, SourceKind};

    #[test]
    fn collect_files_sorts_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join(".hidden.txt"), "h").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.java"), "class C {}").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()]);
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "nested/c.java"]);
    }

    #[test]
    fn collect_files_keeps_plain_paths() {
        let files = collect_files(&[PathBuf::from("/does/not/exist.txt")]);
        assert_eq!(files, vec![PathBuf::from("/does/not/exist.txt")]);
    }

    #[tokio::test]
    async fn load_all_mixes_code_and_text() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Calc.java"), "class Calc {}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "plain notes").unwrap();

        let units = SourceLoader::default()
            .load_all(&[dir.path().to_path_buf()])
            .await
            .unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].metadata.kind, SourceKind::Code);
        assert_eq!(units[0].metadata.language, Some(Lang::Java));
        assert_eq!(units[1].metadata.kind, SourceKind::PlainText);
    }

    #[tokio::test]
    async fn non_pdf_files_of_any_extension_load_as_text() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.properties"), "server.port=8080").unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM eclipse-temurin:21").unwrap();
        std::fs::write(dir.path().join("util.py"), "def f(): pass").unwrap();

        let units = SourceLoader::new(TextLoader::default(), None)
            .load_all(&[dir.path().to_path_buf()])
            .await
            .unwrap();
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].content, "FROM eclipse-temurin:21");
        assert_eq!(units[0].metadata.kind, SourceKind::PlainText);
        assert_eq!(units[1].metadata.kind, SourceKind::PlainText);
        assert_eq!(units[2].metadata.language, Some(Lang::Python));
    }

    #[tokio::test]
    async fn load_all_skips_failures_and_blank_units() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let blank = dir.path().join("blank.txt");
        std::fs::write(&good, "content").unwrap();
        std::fs::write(&blank, "   \n").unwrap();

        let units = SourceLoader::default()
            .load_all(&[good, blank, dir.path().join("missing.txt")])
            .await
            .unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].content, "content");
    }

    #[tokio::test]
    async fn load_all_with_nothing_usable_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "").unwrap();

        let err = SourceLoader::default().load_all(&[blank]).await.unwrap_err();
        assert!(matches!(err, RagError::Ingestion(_)));
    }

    #[tokio::test]
    async fn load_all_empty_input_fails() {
        let err = SourceLoader::default().load_all(&[]).await.unwrap_err();
        assert!(matches!(err, RagError::Ingestion(_)));
    }

    #[tokio::test]
    async fn pdf_without_pdf_loader_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("manual.PDF");
        std::fs::write(&file, b"%PDF-1.4").unwrap();

        let loader = SourceLoader::new(TextLoader::default(), None);
        let err = loader.load_file(&file).await.unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }
}
