//! Retrieval-augmented question answering over a directory of documents.
//!
//! Documents are split into overlapping chunks, embedded into unit vectors,
//! and indexed for exact inner-product search. At query time the most similar
//! chunks are packed into a bounded prompt for a text generator.
//!
//! The embedding model and the generator are external capabilities behind the
//! [`EmbeddingProvider`] and [`Generator`] traits. Enable the `openai` feature
//! for OpenAI-compatible HTTP implementations, and `pdf` / `docx` for the
//! matching document readers.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .generator(Arc::new(generator))
//!     .index_dir("index")
//!     .build()?;
//!
//! pipeline.ingest_dir("data").await?;
//! let answer = pipeline.query("How large are chunks?", 5).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod lazy;
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod store;

pub use chunking::{Chunker, SentenceChunker, chunk_text, split_sentences};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Answer, Chunk, Citation, Document, IngestReport, RetrievedContext};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::Generator;
pub use index::{FlatIndex, Neighbor, VectorIndex};
pub use lazy::LazyProvider;
pub use loader::{DocumentLoader, DocumentReader, PlainTextReader, clean_text};
#[cfg(feature = "docx")]
pub use loader::{DocxReader, docx_xml_text};
#[cfg(feature = "pdf")]
pub use loader::PdfReader;
pub use pipeline::{RagPipeline, RagPipelineBuilder, snippet};
pub use prompt::{PromptAssembler, build_prompt};
pub use retriever::{Retriever, collect_contexts};
pub use store::{IndexManifest, IndexStore, KnowledgeBase};
