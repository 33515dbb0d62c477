//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docqa_rag::config::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_TOP_K,
};
use docqa_rag::openai::{DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL, DEFAULT_MAX_TOKENS};

/// docqa: ask questions about a directory of documents
#[derive(Parser, Debug)]
#[command(name = "docqa", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the index artifacts
    #[arg(long, global = true, env = "DOCQA_INDEX_DIR", default_value = "index")]
    pub index_dir: PathBuf,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk, embed and index every document under a directory
    Ingest(IngestArgs),
    /// Answer a question from the index
    Query(QueryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Directory to read .txt, .md, .pdf and .docx documents from
    #[arg(long, env = "DOCQA_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Maximum chunk size in characters
    #[arg(long, env = "DOCQA_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Characters repeated from the end of one chunk at the start of the next;
    /// must be smaller than --chunk-size
    #[arg(long, env = "DOCQA_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP)]
    pub overlap: usize,

    /// Chunks embedded per provider call
    #[arg(long, env = "DOCQA_BATCH_SIZE", default_value_t = 64)]
    pub batch_size: usize,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Your question
    #[arg(long = "q", short = 'q')]
    pub question: String,

    /// Top-k chunks to retrieve
    #[arg(short, long, env = "DOCQA_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub k: usize,

    /// Character budget for retrieved context in the prompt
    #[arg(long, env = "DOCQA_MAX_CHARS", default_value_t = DEFAULT_MAX_CONTEXT_CHARS)]
    pub max_chars: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// API key for the OpenAI-compatible endpoint
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, global = true, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Embedding model
    #[arg(long, global = true, env = "DOCQA_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Request embeddings truncated to this many dimensions
    #[arg(long, global = true, env = "DOCQA_EMBEDDING_DIMENSIONS")]
    pub dimensions: Option<usize>,

    /// Generation model
    #[arg(long, global = true, env = "DOCQA_GENERATION_MODEL", default_value = DEFAULT_GENERATION_MODEL)]
    pub generation_model: String,

    /// Cap on generated tokens
    #[arg(long, global = true, env = "DOCQA_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Seconds before an embedding or generation call is abandoned
    #[arg(long, global = true, env = "DOCQA_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}
