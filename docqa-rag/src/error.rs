//! Error types for the `docqa-rag` crate.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering queries.
#[derive(Debug, Error)]
pub enum RagError {
    /// The document directory contained nothing that could be ingested.
    #[error("No documents found in {}. Add {extensions} files and rerun.", dir.display())]
    NoDocuments {
        /// The directory that was scanned.
        dir: PathBuf,
        /// The supported extensions, as `.txt/.md/...`.
        extensions: String,
    },

    /// A single document could not be read. Loaders skip these.
    #[error("Failed to read {}: {message}", path.display())]
    DocumentRead {
        /// Path of the unreadable document.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// A query was attempted before an index was written.
    #[error("index not found at {} — run ingest first", dir.display())]
    IndexMissing {
        /// The directory expected to hold the index artifacts.
        dir: PathBuf,
    },

    /// The persisted artifacts disagree with each other.
    #[error("Index is inconsistent: {0}")]
    IndexCorrupt(String),

    /// A vector did not have the dimensionality the index expects.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during answer generation.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An external call did not finish within the request timeout.
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The timeout that elapsed.
        elapsed: Duration,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error while reading or writing index artifacts.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Index artifacts could not be encoded or decoded.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl RagError {
    /// Whether a retry of the failed call might succeed.
    ///
    /// Only external capability failures are retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Embedding { .. } | Self::Generation { .. } | Self::Timeout { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_missing_message_points_at_ingest() {
        let err = RagError::IndexMissing { dir: PathBuf::from("index") };
        assert_eq!(err.to_string(), "index not found at index — run ingest first");
    }

    #[test]
    fn only_capability_errors_are_transient() {
        let embedding = RagError::Embedding { provider: "x".into(), message: "down".into() };
        assert!(embedding.is_transient());
        assert!(
            RagError::Timeout { operation: "generate", elapsed: Duration::from_secs(1) }
                .is_transient()
        );
        assert!(!RagError::IndexCorrupt("bad".into()).is_transient());
        assert!(!RagError::Config("bad".into()).is_transient());
    }
}
