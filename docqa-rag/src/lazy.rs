//! Lazily constructed provider handles.
//!
//! Loading an embedding or generation model can be expensive. A
//! [`LazyProvider`] owns the factory and builds the provider on first use,
//! then reuses it for every later call. It is an ordinary value passed to the
//! pipeline, so tests can hand the pipeline a stub instead.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::generation::Generator;

type Factory<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

/// A provider built on first use by a factory closure.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::LazyProvider;
///
/// let embedder = LazyProvider::new("text-embedding-3-small", || {
///     OpenAIEmbeddingProvider::from_env()
/// })
/// .with_dimensions(1536);
/// ```
pub struct LazyProvider<T> {
    model_name: String,
    dimensions: usize,
    factory: Factory<T>,
    cell: OnceCell<T>,
}

impl<T> LazyProvider<T> {
    /// Create a handle that calls `factory` the first time the provider is needed.
    pub fn new(
        model_name: impl Into<String>,
        factory: impl Fn() -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            dimensions: 0,
            factory: Box::new(factory),
            cell: OnceCell::new(),
        }
    }

    /// Declare the embedding dimensionality reported before the provider is built.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Whether the provider has been built.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Build the provider if needed and return it.
    ///
    /// A failed build is not cached; the next call tries again.
    pub async fn get(&self) -> Result<&T> {
        self.cell
            .get_or_try_init(|| async {
                info!(model = %self.model_name, "initializing provider");
                (self.factory)()
            })
            .await
    }
}

impl<T> fmt::Debug for LazyProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyProvider")
            .field("model_name", &self.model_name)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: EmbeddingProvider> EmbeddingProvider for LazyProvider<T> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.get().await?.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.get().await?.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.cell.get().map_or(self.dimensions, EmbeddingProvider::dimensions)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl<T: Generator> Generator for LazyProvider<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.get().await?.generate(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
