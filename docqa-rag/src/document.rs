//! Data types for documents, chunks, retrieval results, and answers.

use serde::{Deserialize, Serialize};

/// A source document: a stable identifier plus its normalized text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Stable identifier, usually the path the document was loaded from.
    pub source_id: String,
    /// The normalized text content of the document.
    pub text: String,
}

impl Document {
    /// Create a document from an identifier and its text.
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), text: text.into() }
    }
}

/// A contiguous passage of a [`Document`], the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// The passage text.
    pub text: String,
    /// The `source_id` of the parent [`Document`].
    pub source_id: String,
    /// Position of this chunk within its source. Not used for ranking.
    pub ordinal: usize,
}

/// A retrieved [`Chunk`] with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedContext {
    /// The chunk text.
    pub text: String,
    /// The source the chunk came from.
    pub source_id: String,
    /// Inner-product similarity (cosine for unit vectors), higher is better.
    pub score: f32,
    /// Position of the chunk in the index.
    pub position: usize,
}

/// A source snippet shown alongside a generated answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    /// The source the snippet came from.
    pub source_id: String,
    /// The leading characters of the retrieved chunk.
    pub snippet: String,
}

/// The outcome of a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    /// The generated answer, or `None` when retrieval found no context and
    /// generation was skipped.
    pub text: Option<String>,
    /// Cited snippets in retrieval order.
    pub citations: Vec<Citation>,
}

impl Answer {
    /// An answer for a query that retrieved nothing.
    pub fn no_context() -> Self {
        Self { text: None, citations: Vec::new() }
    }

    /// Whether generation was skipped because no context was retrieved.
    pub fn is_no_context(&self) -> bool {
        self.text.is_none()
    }
}

/// Summary of an ingest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of documents that were read and chunked.
    pub documents: usize,
    /// Number of chunks embedded and indexed.
    pub chunks: usize,
}
