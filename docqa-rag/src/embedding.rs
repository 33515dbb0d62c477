//! Embedding provider trait for turning text into unit vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates L2-normalized embeddings from text.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. Returned vectors must have length [`dimensions`](Self::dimensions)
/// and unit norm, since the index ranks by raw inner product. The default
/// [`embed_batch`](Self::embed_batch) implementation calls
/// [`embed`](Self::embed) sequentially; backends that support native batching
/// should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Return the model identifier, recorded alongside persisted indexes.
    fn model_name(&self) -> &str;
}

/// Scale a vector to unit L2 norm in place.
///
/// Zero vectors are left unchanged.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Inner product of two vectors of equal length.
///
/// For unit vectors this is their cosine similarity.
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
