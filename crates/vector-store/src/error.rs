use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("Embedding request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Embedding model mismatch: collection built with '{stored}', configured '{configured}'")]
    ModelMismatch { stored: String, configured: String },

    #[error("Unsupported collection schema_version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl VectorStoreError {
    /// Configuration problems that no retry can fix.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential(_)
                | Self::InvalidDimension { .. }
                | Self::ModelMismatch { .. }
                | Self::SchemaVersion { .. }
                | Self::InvalidConfig(_)
        )
    }
}
