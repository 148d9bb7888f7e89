use serde::{Deserialize, Serialize};

/// A window of document text, immutable once produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk body
    pub text: String,

    /// Tag identifying the source document
    pub source_tag: String,

    /// Ordinal of this chunk within its document (0-indexed)
    #[serde(default)]
    pub index: usize,

    /// Character offset of the window start within the document
    #[serde(default)]
    pub start: usize,
}

impl Chunk {
    /// Create a new chunk
    #[must_use]
    pub fn new(text: String, source_tag: impl Into<String>, index: usize, start: usize) -> Self {
        Self {
            text,
            source_tag: source_tag.into(),
            index,
            start,
        }
    }

    /// Number of characters in the chunk
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Character offset one past the end of the window
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.char_len()
    }

    /// Check if the window covers a character offset
    #[must_use]
    pub fn contains_offset(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_bounds() {
        let chunk = Chunk::new("héllo".to_string(), "doc", 0, 10);
        assert_eq!(chunk.char_len(), 5);
        assert_eq!(chunk.end(), 15);
        assert!(chunk.contains_offset(10));
        assert!(chunk.contains_offset(14));
        assert!(!chunk.contains_offset(15));
        assert!(!chunk.contains_offset(9));
    }

    #[test]
    fn test_chunk_deserializes_without_offsets() {
        let chunk: Chunk =
            serde_json::from_str(r#"{"text":"body","source_tag":"pykale.xml"}"#).unwrap();
        assert_eq!(chunk.index, 0);
        assert_eq!(chunk.start, 0);
        assert_eq!(chunk.source_tag, "pykale.xml");
    }
}
