use crate::store::StoreState;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("System prompt not readable: {path}: {source}")]
    PromptUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation not allowed while conversation is {0:?}")]
    InvalidState(StoreState),

    #[error("Retrieval error: {0}")]
    Search(#[from] kale_search::SearchError),

    #[error("Completion provider error: {0}")]
    Provider(String),

    #[error("Completion stream stalled for {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ChatError {
    /// Fatal errors must stop the assistant before (or instead of) the next turn.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::MissingCredential(_) | Self::PromptUnreadable { .. } | Self::InvalidConfig(_) => {
                true
            }
            Self::Search(err) => err.is_fatal(),
            Self::InvalidState(_)
            | Self::Provider(_)
            | Self::Timeout(_)
            | Self::HttpError(_)
            | Self::SerializationError(_) => false,
        }
    }
}
