use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata, SourceKind,
    detect_language,
};

/// Reads a file as UTF-8 text. Files with a recognized source extension are tagged as
/// code with their language; everything else is plain text.
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for TextLoader {
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

            let content = tokio::fs::read_to_string(&path).await?;

            let language = detect_language(&path);
            let kind = if language.is_some() {
                SourceKind::Code
            } else {
                SourceKind::PlainText
            };
            let mut metadata = DocumentMetadata::new(path.display().to_string(), kind);
            metadata.language = language;

            Ok(vec![Document { content, metadata }])
        })
    }
}
