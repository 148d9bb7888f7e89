use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::types::Chunk;
use std::path::Path;

/// Main chunker interface for splitting documents
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker with configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split a document from a file
    pub fn split_file(&self, path: impl AsRef<Path>) -> Result<Vec<Chunk>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        self.split(&content)
    }

    /// Split text with a greedy sliding window.
    ///
    /// Every character of `content` lands in at least one chunk and the last
    /// window always ends at the end of the document.
    pub fn split(&self, content: &str) -> Result<Vec<Chunk>> {
        if content.is_empty() {
            return Err(ChunkerError::EmptyContent);
        }

        // Byte offset of every char boundary, plus the end of the string.
        let mut boundaries: Vec<usize> = content.char_indices().map(|(i, _)| i).collect();
        boundaries.push(content.len());
        let total_chars = boundaries.len() - 1;

        let size = self.config.chunk_size;
        let stride = self.config.stride();
        let mut chunks = Vec::with_capacity(total_chars / stride + 1);
        let mut start = 0;

        loop {
            let end = (start + size).min(total_chars);
            let text = &content[boundaries[start]..boundaries[end]];
            chunks.push(Chunk::new(
                text.to_string(),
                self.config.source_tag.clone(),
                chunks.len(),
                start,
            ));

            if end == total_chars {
                break;
            }
            start += stride;
        }

        log::debug!(
            "Split {} chars into {} chunks (size={}, overlap={})",
            total_chars,
            chunks.len(),
            size,
            self.config.overlap
        );
        Ok(chunks)
    }
}
