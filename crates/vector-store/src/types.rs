use kale_text_chunker::Chunk;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A stored chunk together with its embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub chunk: Chunk,
}

impl VectorRecord {
    /// Build a record whose id is unique per insertion slot.
    ///
    /// `seq` is the record's position in the collection, so indexing the same
    /// document twice without a reset yields distinct ids (and duplicate text).
    #[must_use]
    pub fn for_chunk(seq: usize, chunk: Chunk, embedding: Vec<f32>) -> Self {
        let digest = Sha256::digest(chunk.text.as_bytes());
        let short: String = format!("{digest:x}").chars().take(12).collect();
        Self {
            id: format!("{}:{seq}:{short}", chunk.source_tag),
            embedding,
            chunk,
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
    pub id: String,
}
