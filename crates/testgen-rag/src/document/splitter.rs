use super::types::{Chunk, Document};
use crate::error::RagError;

/// Boundary preferences, coarsest first: paragraph, line, sentence, word.
/// A hard character cut is the last resort.
const SEPARATOR_TIERS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? ", "; "], &[" "]];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks of one unit.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

impl SplitterConfig {
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Splits text units into overlapping character windows whose edges prefer
/// natural text boundaries.
///
/// Every chunk holds at most `chunk_size` characters, and chunk `i + 1` starts
/// with the last `chunk_overlap` characters of chunk `i`.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: SplitterConfig,
}

impl RecursiveSplitter {
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the configuration is invalid.
    pub fn new(config: SplitterConfig) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        if document.content.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.content.chars().collect();
        window_bounds(&chars, self.config.chunk_size, self.config.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| Chunk {
                content: chars[start..end].iter().collect(),
                metadata: document.metadata.clone(),
                chunk_index: i,
            })
            .collect()
    }

    /// Split a batch, preserving unit order.
    #[must_use]
    pub fn split_all(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|doc| self.split(doc)).collect()
    }
}

fn window_bounds(chars: &[char], chunk_size: usize, overlap: usize) -> Vec<(usize, usize)> {
    let len = chars.len();
    let mut bounds = Vec::new();
    let mut start = 0;

    loop {
        if len - start <= chunk_size {
            bounds.push((start, len));
            return bounds;
        }
        // end must exceed start + overlap so the next window makes progress
        let lo = start + overlap + 1;
        let hi = start + chunk_size;
        let end = find_boundary(chars, start, lo, hi, SEPARATOR_TIERS);
        bounds.push((start, end));
        start = end - overlap;
    }
}

/// Latest end position in `lo..=hi` that closes a separator from the first tier
/// with any match, recursing into finer tiers; `hi` when none match.
fn find_boundary(chars: &[char], start: usize, lo: usize, hi: usize, tiers: &[&[&str]]) -> usize {
    let Some((tier, finer)) = tiers.split_first() else {
        return hi;
    };
    for end in (lo..=hi).rev() {
        let window = &chars[start..end];
        if tier.iter().any(|sep| ends_with(window, sep)) {
            return end;
        }
    }
    find_boundary(chars, start, lo, hi, finer)
}

fn ends_with(window: &[char], sep: &str) -> bool {
    let n = sep.chars().count();
    window.len() >= n && window[window.len() - n..].iter().copied().eq(sep.chars())
}
