use crate::error::{Result, SearchError};
use async_trait::async_trait;
use kale_text_chunker::Chunk;
use kale_vector_store::{EmbeddingModel, SearchResult, VectorCollection};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(15);

const MAX_ATTEMPTS: usize = 2;

/// Anything that can supply context chunks for a query.
#[async_trait]
pub trait ChunkRetriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>>;
}

/// Top-k semantic retrieval over a shared, read-only collection.
#[derive(Clone)]
pub struct Retriever {
    collection: Arc<VectorCollection>,
    embedder: Arc<EmbeddingModel>,
    timeout: Duration,
}

impl Retriever {
    /// Refuses a collection built with a different embedding model.
    pub fn new(collection: Arc<VectorCollection>, embedder: Arc<EmbeddingModel>) -> Result<Self> {
        collection.check_model(embedder.model_id())?;
        if let (Some(stored), Some(expected)) = (collection.dimension(), embedder.dimension()) {
            if stored != expected {
                return Err(kale_vector_store::VectorStoreError::InvalidDimension {
                    expected: stored,
                    actual: expected,
                }
                .into());
            }
        }
        Ok(Self {
            collection,
            embedder,
            timeout: DEFAULT_RETRIEVAL_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn collection(&self) -> &VectorCollection {
        &self.collection
    }

    /// Scored hits, best first. Transient failures are retried once.
    pub async fn retrieve_scored(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 || self.collection.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_retrieve(query, k).await {
                Ok(hits) => return Ok(hits),
                Err(err) if err.is_fatal() || attempt >= MAX_ATTEMPTS => return Err(err),
                Err(err) => {
                    log::warn!("Retrieval attempt {attempt} failed: {err}; retrying");
                }
            }
        }
    }

    async fn try_retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let embedding = tokio::time::timeout(self.timeout, self.embedder.embed(query))
            .await
            .map_err(|_| SearchError::Timeout(self.timeout))??;
        let hits = self.collection.similarity_search(&embedding, k)?;
        log::debug!("Retrieved {} chunks for query ({} chars)", hits.len(), query.len());
        Ok(hits)
    }
}

#[async_trait]
impl ChunkRetriever for Retriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .retrieve_scored(query, k)
            .await?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect())
    }
}
