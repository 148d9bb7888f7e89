use serde::{Deserialize, Serialize};

/// Outcome of one indexing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Characters in the source document
    pub characters: usize,

    /// Chunks produced and embedded in this run
    pub chunks: usize,

    /// Records in the collection after the run
    pub total_records: usize,

    /// Whether the collection was cleared first
    pub reset: bool,

    /// Embedding dimensionality of the collection
    pub dimension: Option<usize>,

    /// Time taken in milliseconds
    pub time_ms: u64,
}
