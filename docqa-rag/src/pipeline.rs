//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the ingest workflow (load → chunk → embed →
//! index → persist) and the query workflow (embed → search → assemble prompt
//! → generate) by composing an [`EmbeddingProvider`], a [`Generator`], a
//! [`Chunker`], a [`DocumentLoader`] and an [`IndexStore`].
//!
//! The active [`KnowledgeBase`] is held behind an `Arc` that queries clone
//! and release. Ingest builds a complete replacement and swaps the pointer,
//! so in-flight queries never observe a partially built index.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RagPipeline, RagConfig};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .generator(Arc::new(generator))
//!     .index_dir("index")
//!     .build()?;
//!
//! pipeline.ingest_dir("data").await?;
//! let answer = pipeline.query("What is overlap?", 5).await?;
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::chunking::{Chunker, SentenceChunker};
use crate::config::RagConfig;
use crate::document::{Answer, Chunk, Citation, Document, IngestReport, RetrievedContext};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::Generator;
use crate::loader::DocumentLoader;
use crate::prompt::PromptAssembler;
use crate::retriever::Retriever;
use crate::store::{IndexStore, KnowledgeBase};

/// Number of characters of each chunk shown in a citation.
pub const SNIPPET_CHARS: usize = 200;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// The RAG pipeline orchestrator. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn Generator>,
    chunker: Arc<dyn Chunker>,
    loader: DocumentLoader,
    store: IndexStore,
    assembler: PromptAssembler,
    knowledge_base: RwLock<Arc<KnowledgeBase>>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return the index store.
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// A snapshot of the active knowledge base.
    pub async fn knowledge_base(&self) -> Arc<KnowledgeBase> {
        self.knowledge_base.read().await.clone()
    }

    /// Make `knowledge_base` the active one. Queries already running keep
    /// the snapshot they started with.
    pub async fn replace_knowledge_base(&self, knowledge_base: KnowledgeBase) {
        *self.knowledge_base.write().await = Arc::new(knowledge_base);
    }

    /// Chunk and embed documents into a new knowledge base.
    ///
    /// Documents are chunked in order; chunk texts are embedded in batches
    /// of `embed_batch_size`. Nothing is persisted or activated.
    ///
    /// # Errors
    ///
    /// Returns the embedding error after retries are exhausted, or
    /// [`RagError::IndexCorrupt`] if the provider returns the wrong number of
    /// vectors.
    pub async fn build_knowledge_base(&self, documents: &[Document]) -> Result<KnowledgeBase> {
        let chunks: Vec<Chunk> =
            documents.iter().flat_map(|document| self.chunker.chunk(document)).collect();
        info!(documents = documents.len(), chunks = chunks.len(), "chunked documents");

        let embedder = &self.embedding_provider;
        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.config.embed_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let texts = texts.as_slice();
            let embedded = with_retry("embed", &self.config, move || embedder.embed_batch(texts))
                .await
                .map_err(|e| {
                    error!(batch_size = texts.len(), error = %e, "embedding failed");
                    e
                })?;
            vectors.extend(embedded);
        }

        let dimensions =
            vectors.first().map_or_else(|| self.embedding_provider.dimensions(), Vec::len);
        let mut knowledge_base =
            KnowledgeBase::new(dimensions, self.embedding_provider.model_name());
        knowledge_base.extend(chunks, vectors)?;
        Ok(knowledge_base)
    }

    /// Ingest every document under `data_dir`, overwrite the persisted index,
    /// and make the result active.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NoDocuments`] if the directory yields nothing to
    /// ingest. Individual unreadable documents are skipped, not fatal.
    pub async fn ingest_dir(&self, data_dir: impl AsRef<Path>) -> Result<IngestReport> {
        let documents = self.loader.load(data_dir)?;
        let knowledge_base = self.build_knowledge_base(&documents).await?;
        let report = IngestReport { documents: documents.len(), chunks: knowledge_base.len() };

        self.store.save(&knowledge_base).await?;
        self.replace_knowledge_base(knowledge_base).await;
        info!(documents = report.documents, chunks = report.chunks, "ingest completed");
        Ok(report)
    }

    /// Load the persisted index and make it active.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexMissing`] if nothing has been ingested,
    /// [`RagError::IndexCorrupt`] if the artifacts disagree, or
    /// [`RagError::DimensionMismatch`] if the index was built with an
    /// embedding model of a different dimensionality.
    pub async fn load_index(&self) -> Result<()> {
        let knowledge_base = self.store.load().await?;

        let expected = self.embedding_provider.dimensions();
        if expected != 0 && expected != knowledge_base.dimensions() {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: knowledge_base.dimensions(),
            });
        }
        if knowledge_base.embedding_model() != self.embedding_provider.model_name() {
            warn!(
                indexed_with = knowledge_base.embedding_model(),
                querying_with = self.embedding_provider.model_name(),
                "index was built with a different embedding model"
            );
        }

        info!(chunks = knowledge_base.len(), dir = %self.store.dir().display(), "loaded index");
        self.replace_knowledge_base(knowledge_base).await;
        Ok(())
    }

    /// Retrieve up to `k` contexts for `question` from the active knowledge base.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievedContext>> {
        let retriever =
            Retriever::new(self.embedding_provider.clone(), self.knowledge_base().await);
        let retriever = &retriever;
        with_retry("embed", &self.config, move || retriever.retrieve(question, k)).await
    }

    /// Answer `question` from the `k` most similar chunks.
    ///
    /// When retrieval finds nothing, generation is skipped and
    /// [`Answer::no_context`] is returned.
    pub async fn query(&self, question: &str, k: usize) -> Result<Answer> {
        let contexts = self.retrieve(question, k).await?;
        if contexts.is_empty() {
            info!(k, "no context found, skipping generation");
            return Ok(Answer::no_context());
        }

        let prompt = self.assembler.build(&contexts, question);
        let (generator, prompt) = (&self.generator, prompt.as_str());
        let text = with_retry("generate", &self.config, move || generator.generate(prompt))
            .await
            .map_err(|e| {
                error!(error = %e, "generation failed");
                e
            })?;

        let citations = contexts
            .iter()
            .map(|c| Citation { source_id: c.source_id.clone(), snippet: snippet(&c.text) })
            .collect();

        info!(k, contexts = contexts.len(), "query completed");
        Ok(Answer { text: Some(text), citations })
    }
}

/// The first [`SNIPPET_CHARS`] characters of `text`, with `...` appended when cut.
pub fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Run an external call under the request timeout, retrying transient
/// failures up to `max_retries` times with linear backoff.
async fn with_retry<T, F, Fut>(
    operation: &'static str,
    config: &RagConfig,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let timeout = config.request_timeout();
    let mut attempt = 0;
    loop {
        let result = tokio::time::timeout(timeout, call())
            .await
            .unwrap_or_else(|_| Err(RagError::Timeout { operation, elapsed: timeout }));

        match result {
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                warn!(operation, attempt, error = %e, "external call failed, retrying");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            other => return other,
        }
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` and `generator` are required. The chunker defaults to
/// a [`SentenceChunker`] sized from the config, the loader to
/// [`DocumentLoader::default`], and the index directory to `index`.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn Generator>>,
    chunker: Option<Arc<dyn Chunker>>,
    loader: Option<DocumentLoader>,
    index_dir: Option<PathBuf>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the answer generator.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the document loader.
    pub fn loader(mut self, loader: DocumentLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the directory the index artifacts are written to and read from.
    pub fn index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = Some(dir.into());
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or the
    /// config fails [`RagConfig::validate`].
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| RagError::Config("generator is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(SentenceChunker::new(config.chunk_size, config.chunk_overlap))
        });
        let knowledge_base =
            KnowledgeBase::new(embedding_provider.dimensions(), embedding_provider.model_name());

        Ok(RagPipeline {
            assembler: PromptAssembler::new(config.max_context_chars),
            store: IndexStore::new(self.index_dir.unwrap_or_else(|| PathBuf::from("index"))),
            loader: self.loader.unwrap_or_default(),
            knowledge_base: RwLock::new(Arc::new(knowledge_base)),
            config,
            embedding_provider,
            generator,
            chunker,
        })
    }
}
