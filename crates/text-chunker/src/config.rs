use serde::{Deserialize, Serialize};

/// Default window size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default number of characters shared by consecutive windows
pub const DEFAULT_OVERLAP: usize = 100;

/// Source tag stamped on every chunk of the reference document
pub const DEFAULT_SOURCE_TAG: &str = "pykale.xml";

/// Configuration for sliding-window chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Window size in characters
    pub chunk_size: usize,

    /// Characters shared between consecutive windows
    pub overlap: usize,

    /// Tag recorded on every produced chunk
    pub source_tag: String,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
        }
    }
}

impl ChunkerConfig {
    /// Create config with explicit window geometry and the default source tag
    #[must_use]
    pub fn with_window(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            ..Default::default()
        }
    }

    /// Builder: set source tag
    #[must_use]
    pub fn source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = tag.into();
        self
    }

    /// Distance between the starts of consecutive windows
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.overlap)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        // overlap == chunk_size would never advance the window
        if self.overlap >= self.chunk_size {
            return Err(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            ));
        }

        if self.source_tag.trim().is_empty() {
            return Err("source_tag must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ChunkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stride(), 900);
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkerConfig::with_window(0, 0).validate().is_err());
        assert!(ChunkerConfig::with_window(100, 100).validate().is_err());
        assert!(ChunkerConfig::with_window(100, 150).validate().is_err());
        assert!(ChunkerConfig::with_window(100, 99).validate().is_ok());
        assert!(ChunkerConfig::with_window(1, 0).validate().is_ok());

        let blank_tag = ChunkerConfig::default().source_tag("  ");
        assert!(blank_tag.validate().is_err());
    }
}
