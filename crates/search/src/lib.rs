//! # Kale Search
//!
//! Semantic retrieval of documentation chunks for the chat assistant.
//!
//! The [`Retriever`] embeds a query with the same model that built the
//! collection and returns at most `k` chunks, most similar first. Equal scores
//! keep collection insertion order. An empty collection yields no chunks.
//!
//! Errors split two ways: [`SearchError::is_fatal`] marks configuration
//! problems (model or dimension mismatch) that must stop the assistant; all
//! other failures are retried once and then treated as "no context found" by
//! the caller.

mod context;
mod error;
mod retriever;

pub use context::format_context;
pub use error::{Result, SearchError};
pub use retriever::{ChunkRetriever, Retriever, DEFAULT_RETRIEVAL_TIMEOUT, DEFAULT_TOP_K};
