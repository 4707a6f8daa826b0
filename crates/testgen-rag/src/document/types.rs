use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::languages::Lang;

/// Kind of source a text unit was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Pdf,
    Code,
    PlainText,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Code => "code",
            Self::PlainText => "plain-text",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Lang>,
    /// 1-based page number for PDF pages extracted directly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            source: source.into(),
            kind,
            language: None,
            page: None,
            extra: HashMap::new(),
        }
    }
}

/// A text unit produced by a loader: one file, or one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunk_index: usize,
}
