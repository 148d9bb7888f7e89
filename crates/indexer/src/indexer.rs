use crate::error::{IndexerError, Result};
use crate::index_lock::acquire_index_write_lock;
use crate::stats::IndexStats;
use kale_text_chunker::{
    Chunker, ChunkerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP, DEFAULT_SOURCE_TAG,
};
use kale_vector_store::{EmbeddingModel, VectorCollection, VectorRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

const DEFAULT_BATCH_SIZE: usize = 64;

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub chunk_size: usize,
    pub overlap: usize,
    pub source_tag: String,
    /// Clear the collection before writing. Without it, re-indexing appends.
    pub reset: bool,
    pub batch_size: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            reset: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl IndexOptions {
    fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig::with_window(self.chunk_size, self.overlap)
            .source_tag(self.source_tag.clone())
    }
}

/// Progress of the embedding phase, reported after every batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexProgress {
    pub embedded: usize,
    pub total: usize,
}

/// Builds one persisted collection from a reference document.
pub struct DocumentIndexer {
    persist_dir: PathBuf,
    collection: String,
    embedder: Arc<EmbeddingModel>,
    options: IndexOptions,
}

impl DocumentIndexer {
    /// Window options are validated here, before any file or provider is touched.
    pub fn new(
        persist_dir: impl Into<PathBuf>,
        collection: impl Into<String>,
        embedder: Arc<EmbeddingModel>,
        options: IndexOptions,
    ) -> Result<Self> {
        Chunker::new(options.chunker_config())?;
        Ok(Self {
            persist_dir: persist_dir.into(),
            collection: collection.into(),
            embedder,
            options,
        })
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub async fn index_file(&self, path: impl AsRef<Path>) -> Result<IndexStats> {
        self.index_file_with_progress(path, |_| {}).await
    }

    pub async fn index_file_with_progress<F>(
        &self,
        path: impl AsRef<Path>,
        on_progress: F,
    ) -> Result<IndexStats>
    where
        F: FnMut(IndexProgress),
    {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IndexerError::DocumentUnreadable {
                path: path.display().to_string(),
                source,
            })?;
        log::info!("Indexing {} ({} bytes)", path.display(), text.len());
        self.index_text_with_progress(&text, on_progress).await
    }

    pub async fn index_text(&self, text: &str) -> Result<IndexStats> {
        self.index_text_with_progress(text, |_| {}).await
    }

    pub async fn index_text_with_progress<F>(
        &self,
        text: &str,
        mut on_progress: F,
    ) -> Result<IndexStats>
    where
        F: FnMut(IndexProgress),
    {
        let start = Instant::now();
        let chunker = Chunker::new(self.options.chunker_config())?;
        let chunks = chunker.split(text)?;

        let _write_lock = acquire_index_write_lock(&self.persist_dir, &self.collection).await?;
        let mut collection = VectorCollection::open(&self.persist_dir, &self.collection).await?;
        if self.options.reset {
            log::info!(
                "Clearing collection '{}' ({} records)",
                self.collection,
                collection.len()
            );
            collection.clear();
        }
        collection.bind_model(self.embedder.model_id())?;

        let total = chunks.len();
        let batch_size = self.options.batch_size.max(1);
        let mut embedded = 0usize;
        let mut pending = chunks.into_iter().peekable();
        while pending.peek().is_some() {
            let batch: Vec<_> = pending.by_ref().take(batch_size).collect();
            let texts: Vec<&str> = batch.iter().map(|chunk| chunk.text.as_str()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(IndexerError::Other(format!(
                    "embedding provider returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }

            let base = collection.len();
            let records: Vec<VectorRecord> = batch
                .into_iter()
                .zip(vectors)
                .enumerate()
                .map(|(offset, (chunk, vector))| {
                    VectorRecord::for_chunk(base + offset, chunk, vector)
                })
                .collect();
            embedded += collection.upsert(records)?;
            log::debug!("Embedded {embedded}/{total} chunks");
            on_progress(IndexProgress { embedded, total });
        }

        collection.save().await?;

        let stats = IndexStats {
            characters: text.chars().count(),
            chunks: total,
            total_records: collection.len(),
            reset: self.options.reset,
            dimension: collection.dimension(),
            time_ms: start.elapsed().as_millis() as u64,
        };
        log::info!(
            "Indexed {} chunks into '{}' ({} records total) in {} ms",
            stats.chunks,
            self.collection,
            stats.total_records,
            stats.time_ms
        );
        Ok(stats)
    }
}

/// Chunk, embed and persist `document_text` with the given window.
pub async fn build_index(
    document_text: &str,
    persist_dir: impl Into<PathBuf>,
    collection: &str,
    embedder: Arc<EmbeddingModel>,
    options: IndexOptions,
) -> Result<IndexStats> {
    DocumentIndexer::new(persist_dir, collection, embedder, options)?
        .index_text(document_text)
        .await
}
