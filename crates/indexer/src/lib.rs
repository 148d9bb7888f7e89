//! # Kale Indexer
//!
//! Offline batch indexing of a reference document into a vector collection.
//!
//! ## Pipeline
//!
//! ```text
//! Document
//!     │
//!     ├──> Chunker (fixed window, overlap)
//!     │      └─> Chunks tagged with source
//!     │
//!     ├──> EmbeddingModel (batched)
//!     │
//!     └──> VectorCollection (exclusive write lock, atomic save)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kale_indexer::{DocumentIndexer, IndexOptions};
//! use kale_vector_store::EmbeddingModel;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = Arc::new(EmbeddingModel::from_env()?);
//!     let indexer =
//!         DocumentIndexer::new("vector_db", "pykale_xml", embedder, IndexOptions::default())?;
//!     let stats = indexer.index_file("data/pykale.xml").await?;
//!
//!     println!("Indexed {} chunks", stats.chunks);
//!     Ok(())
//! }
//! ```

mod error;
mod index_lock;
mod indexer;
mod stats;

pub use error::{IndexerError, Result};
pub use indexer::{build_index, DocumentIndexer, IndexOptions, IndexProgress};
pub use stats::IndexStats;
