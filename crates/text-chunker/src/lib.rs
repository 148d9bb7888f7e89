//! # Kale Text Chunker
//!
//! Fixed-window, overlapping text chunking for documentation retrieval.
//!
//! ## Window model
//!
//! ```text
//! document:  |--------------------------------------------------|
//! chunk 0:   |==========|
//! chunk 1:            |==========|          (overlap = shared tail)
//! chunk 2:                     |==========|
//! last:                                 |=====|   (may be shorter)
//! ```
//!
//! Windows are measured in characters (Unicode scalar values), never bytes,
//! so multi-byte text is never split inside a code point.
//!
//! ## Example
//!
//! ```rust
//! use kale_text_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//! let text = "a".repeat(2500);
//! let chunks = chunker.split(&text).unwrap();
//!
//! let lengths: Vec<usize> = chunks.iter().map(|c| c.char_len()).collect();
//! assert_eq!(lengths, vec![1000, 1000, 700]);
//! ```

mod chunker;
mod config;
mod error;
mod types;

pub use chunker::Chunker;
pub use config::{ChunkerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP, DEFAULT_SOURCE_TAG};
pub use error::{ChunkerError, Result};
pub use types::Chunk;
