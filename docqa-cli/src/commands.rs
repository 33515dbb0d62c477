//! `ingest` and `query` command handlers.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use docqa_rag::openai::{OpenAIEmbeddingProvider, OpenAIGenerator};
use docqa_rag::{LazyProvider, RagConfig, RagError, RagPipeline};
use tracing::debug;

use crate::cli::{Cli, Command, IngestArgs, ProviderArgs, QueryArgs};

pub const NO_CONTEXT: &str = "No context found. Did you run ingest?";

/// Dispatch the parsed command line, writing command output to `out`.
pub async fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Command::Ingest(args) => {
            let config = ingest_config(args, &cli.provider)?;
            let pipeline = build_pipeline(&cli.provider, &cli.index_dir, config)?;
            ingest(&pipeline, &args.data_dir, out).await
        }
        Command::Query(args) => {
            let config = query_config(args, &cli.provider)?;
            let pipeline = build_pipeline(&cli.provider, &cli.index_dir, config)?;
            query(&pipeline, &args.question, args.k, out).await
        }
    }
}

fn ingest_config(args: &IngestArgs, provider: &ProviderArgs) -> Result<RagConfig> {
    RagConfig::builder()
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.overlap)
        .embed_batch_size(args.batch_size)
        .request_timeout(Duration::from_secs(provider.timeout_secs))
        .build()
        .context("invalid ingest options")
}

fn query_config(args: &QueryArgs, provider: &ProviderArgs) -> Result<RagConfig> {
    RagConfig::builder()
        .top_k(args.k)
        .max_context_chars(args.max_chars)
        .request_timeout(Duration::from_secs(provider.timeout_secs))
        .build()
        .context("invalid query options")
}

/// Wire OpenAI-compatible providers into a pipeline.
///
/// Providers are built on first use, so commands that never reach the
/// embedding or generation step do not need an API key.
pub fn build_pipeline(
    provider: &ProviderArgs,
    index_dir: &Path,
    config: RagConfig,
) -> Result<RagPipeline> {
    let (api_key, base_url) = (provider.api_key.clone(), provider.base_url.clone());
    let (model, dimensions) = (provider.embedding_model.clone(), provider.dimensions);
    let embedder = LazyProvider::new(provider.embedding_model.clone(), move || {
        let mut embedder = match &api_key {
            Some(key) => OpenAIEmbeddingProvider::new(key.clone())?,
            None => OpenAIEmbeddingProvider::from_env()?,
        }
        .with_model(model.clone());
        if let Some(url) = &base_url {
            embedder = embedder.with_base_url(url.clone());
        }
        if let Some(dimensions) = dimensions {
            embedder = embedder.with_dimensions(dimensions);
        }
        Ok(embedder)
    });
    let embedder = match provider.dimensions {
        Some(dimensions) => embedder.with_dimensions(dimensions),
        None => embedder,
    };

    let (api_key, base_url) = (provider.api_key.clone(), provider.base_url.clone());
    let (model, max_tokens) = (provider.generation_model.clone(), provider.max_tokens);
    let generator = LazyProvider::new(provider.generation_model.clone(), move || {
        let generator = match &api_key {
            Some(key) => OpenAIGenerator::new(key.clone())?,
            None => OpenAIGenerator::from_env()?,
        }
        .with_model(model.clone())
        .with_max_tokens(max_tokens);
        Ok(match &base_url {
            Some(url) => generator.with_base_url(url.clone()),
            None => generator,
        })
    });

    debug!(
        embedding_model = %provider.embedding_model,
        generation_model = %provider.generation_model,
        index_dir = %index_dir.display(),
        "building pipeline"
    );
    Ok(RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .generator(Arc::new(generator))
        .index_dir(index_dir)
        .build()?)
}

/// Ingest `data_dir` and report what was indexed.
pub async fn ingest(pipeline: &RagPipeline, data_dir: &Path, out: &mut impl Write) -> Result<()> {
    let report = pipeline.ingest_dir(data_dir).await?;
    writeln!(out, "Loaded {} docs -> {} chunks", report.documents, report.chunks)?;
    writeln!(out, "Saved index to {}", pipeline.store().dir().display())?;
    Ok(())
}

/// Load the persisted index, answer `question`, and print the answer with its sources.
///
/// A missing index is an error; an empty retrieval is not.
pub async fn query(
    pipeline: &RagPipeline,
    question: &str,
    k: usize,
    out: &mut impl Write,
) -> Result<()> {
    match pipeline.load_index().await {
        Err(e @ RagError::IndexMissing { .. }) => return Err(e.into()),
        other => other.context("failed to load index")?,
    }

    let answer = pipeline.query(question, k).await?;
    let Some(text) = answer.text else {
        writeln!(out, "{NO_CONTEXT}")?;
        return Ok(());
    };

    writeln!(out, "\n=== Answer ===")?;
    writeln!(out, "{text}")?;
    writeln!(out, "\n=== Sources (top snippets) ===")?;
    for (i, citation) in answer.citations.iter().enumerate() {
        writeln!(out, "[{}] {} :: {}", i + 1, citation.source_id, citation.snippet)?;
    }
    Ok(())
}
