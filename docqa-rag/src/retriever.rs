//! Query-time retrieval: embed, search, deduplicate, resolve chunks.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::document::{Chunk, RetrievedContext};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{Neighbor, VectorIndex};
use crate::store::KnowledgeBase;

/// Finds the chunks most similar to a query in a [`KnowledgeBase`].
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::Retriever;
///
/// let retriever = Retriever::new(embedder, knowledge_base);
/// for context in retriever.retrieve("what is overlap?", 5).await? {
///     println!("{:.3} {}", context.score, context.source_id);
/// }
/// ```
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    knowledge_base: Arc<KnowledgeBase>,
}

impl Retriever {
    /// Create a retriever over a knowledge base snapshot.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, knowledge_base: Arc<KnowledgeBase>) -> Self {
        Self { embedder, knowledge_base }
    }

    /// Return up to `k` chunks ordered by descending similarity to `query`.
    ///
    /// An empty knowledge base yields an empty result without calling the
    /// embedding provider.
    ///
    /// # Errors
    ///
    /// Returns the embedding provider's error, or
    /// [`RagError::DimensionMismatch`] if the query embedding does not match
    /// the index.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedContext>> {
        if self.knowledge_base.is_empty() {
            debug!("knowledge base is empty, skipping retrieval");
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let index: &dyn VectorIndex = self.knowledge_base.index();
        if embedding.len() != index.dimensions() {
            return Err(RagError::DimensionMismatch {
                expected: index.dimensions(),
                actual: embedding.len(),
            });
        }

        let neighbors = index.search(&embedding, k)?;
        let contexts = collect_contexts(&neighbors, self.knowledge_base.chunks());
        debug!(requested = k, returned = contexts.len(), "retrieved contexts");
        Ok(contexts)
    }
}

/// Resolve search hits to chunks, in hit order.
///
/// Empty slots, positions outside `chunks`, and positions already taken are
/// skipped. Deduplication is by position, so distinct chunks with identical
/// text are all kept.
pub fn collect_contexts(neighbors: &[Neighbor], chunks: &[Chunk]) -> Vec<RetrievedContext> {
    let mut seen = HashSet::new();
    neighbors
        .iter()
        .filter_map(|neighbor| {
            let position = neighbor.position?;
            let chunk = chunks.get(position)?;
            seen.insert(position).then(|| RetrievedContext {
                text: chunk.text.clone(),
                source_id: chunk.source_id.clone(),
                score: neighbor.score,
                position,
            })
        })
        .collect()
}
