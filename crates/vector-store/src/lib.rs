//! # Kale Vector Store
//!
//! Embedding provider plus a persisted, named collection of embedded
//! documentation chunks with cosine similarity search.
//!
//! ## Architecture
//!
//! ```text
//! Chunk[]
//!     │
//!     ├──> EmbeddingModel (OpenAI or deterministic stub)
//!     │      └─> Vector[1536 | N]
//!     │
//!     ├──> VectorCollection
//!     │      ├─> upsert by record id
//!     │      └─> flat cosine top-k
//!     │
//!     └──> <persist_dir>/<collection>/collection.json
//! ```
//!
//! The same [`EmbeddingModel`] must be used to build and to query a
//! collection; the collection records the model id and refuses a different one.
//!
//! ## Example
//!
//! ```no_run
//! use kale_vector_store::{EmbeddingModel, VectorCollection};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let collection = VectorCollection::open("vector_db", "pykale_xml").await?;
//!     let model = EmbeddingModel::from_env()?;
//!     collection.check_model(model.model_id())?;
//!
//!     let query = model.embed("how does domain adaptation work").await?;
//!     for hit in collection.similarity_search(&query, 3)? {
//!         println!("{:.3} {}", hit.score, hit.id);
//!     }
//!     Ok(())
//! }
//! ```

mod collection;
mod embeddings;
mod error;
mod flat_index;
mod paths;
mod types;

pub use collection::{VectorCollection, COLLECTION_SCHEMA_VERSION};
pub use embeddings::{
    EmbeddingConfig, EmbeddingMode, EmbeddingModel, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_OPENAI_BASE_URL, STUB_DIMENSION,
};
pub use error::{Result, VectorStoreError};
pub use flat_index::cosine_similarity;
pub use paths::{
    collection_dir, collection_file, collection_lock_file, DEFAULT_COLLECTION,
    DEFAULT_PERSIST_DIR,
};
pub use types::{SearchResult, VectorRecord};

pub use kale_text_chunker::Chunk;
