use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] kale_vector_store::VectorStoreError),

    #[error("Retrieval timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Fatal errors are configuration problems; everything else degrades to
    /// "no context found".
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::VectorStoreError(err) => err.is_config_error(),
            Self::Timeout(_) | Self::Other(_) => false,
        }
    }
}
