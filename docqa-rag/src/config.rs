//! Configuration for the RAG pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Default overlap carried from one chunk into the next, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 120;
/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;
/// Default character budget for chunk text in a prompt.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 3000;

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters. Single oversized sentences may exceed it.
    pub chunk_size: usize,
    /// Number of trailing characters of a chunk repeated at the start of the next.
    pub chunk_overlap: usize,
    /// Number of top results to retrieve per query.
    pub top_k: usize,
    /// Character budget for chunk text in the generation prompt.
    pub max_context_chars: usize,
    /// Number of chunk texts sent to the embedding provider per call.
    pub embed_batch_size: usize,
    /// Timeout applied to each embedding or generation call, in seconds.
    pub request_timeout_secs: u64,
    /// Additional attempts after a failed embedding or generation call.
    pub max_retries: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            embed_batch_size: 64,
            request_timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that parameters are consistent.
    ///
    /// Fields are public and the type deserializes, so values that did not
    /// come through [`RagConfigBuilder`] are checked here as well.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `max_context_chars == 0`
    /// - `embed_batch_size == 0`
    /// - `request_timeout` is under one second
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.max_context_chars == 0 {
            return Err(RagError::Config("max_context_chars must be greater than zero".to_string()));
        }
        if self.embed_batch_size == 0 {
            return Err(RagError::Config("embed_batch_size must be greater than zero".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(RagError::Config("request_timeout must be at least one second".to_string()));
        }
        Ok(())
    }

    /// The per-call timeout for external capabilities.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to retrieve.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the character budget for chunk text in prompts.
    pub fn max_context_chars(mut self, max_chars: usize) -> Self {
        self.config.max_context_chars = max_chars;
        self
    }

    /// Set the number of texts embedded per provider call.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Set the per-call timeout for embedding and generation.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Set how many times a failed external call is retried.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] under the conditions listed on
    /// [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 120);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.max_context_chars, 3000);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::Config(msg) if msg.contains("chunk_overlap")));
    }

    #[test]
    fn rejects_zero_top_k_and_batch_size() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
        assert!(RagConfig::builder().embed_batch_size(0).build().is_err());
        assert!(RagConfig::builder().request_timeout(Duration::from_millis(10)).build().is_err());
    }

    #[test]
    fn allows_zero_overlap() {
        let config = RagConfig::builder().chunk_size(30).chunk_overlap(0).build().unwrap();
        assert_eq!(config.chunk_overlap, 0);
    }

    #[test]
    fn validate_catches_struct_literal_and_deserialized_values() {
        let literal = RagConfig { embed_batch_size: 0, ..RagConfig::default() };
        let err = literal.validate().unwrap_err();
        assert!(matches!(err, RagError::Config(msg) if msg.contains("embed_batch_size")));

        let parsed: RagConfig = serde_json::from_value(serde_json::json!({
            "chunk_size": 0, "chunk_overlap": 0, "top_k": 5, "max_context_chars": 3000,
            "embed_batch_size": 64, "request_timeout_secs": 60, "max_retries": 2
        }))
        .unwrap();
        assert!(parsed.validate().is_err());
        assert!(RagConfig::default().validate().is_ok());
    }
}
