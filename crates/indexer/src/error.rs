use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Chunker error: {0}")]
    ChunkerError(#[from] kale_text_chunker::ChunkerError),

    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] kale_vector_store::VectorStoreError),

    #[error("Source document not readable: {path}: {source}")]
    DocumentUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl IndexerError {
    /// Indexing never retries; every error aborts the run. Errors reported here
    /// come from configuration rather than a transient provider failure.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::DocumentUnreadable { .. } => true,
            Self::ChunkerError(kale_text_chunker::ChunkerError::InvalidConfig(_)) => true,
            Self::VectorStoreError(err) => err.is_config_error(),
            _ => false,
        }
    }
}
