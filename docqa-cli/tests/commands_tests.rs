//! Command output with stub providers in place of the HTTP ones.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use docqa_cli::Cli;
use docqa_cli::commands::{self, NO_CONTEXT};
use docqa_rag::embedding::normalize;
use docqa_rag::{EmbeddingProvider, Generator, RagConfig, RagPipeline, Result};

struct VowelEmbedder;

#[async_trait]
impl EmbeddingProvider for VowelEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v: Vec<f32> = "aeiou"
            .chars()
            .map(|vowel| text.chars().filter(|c| c.to_ascii_lowercase() == vowel).count() as f32)
            .collect();
        v.push(1.0);
        normalize(&mut v);
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        6
    }

    fn model_name(&self) -> &str {
        "vowels"
    }
}

struct FixedGenerator;

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok("Chunks overlap by 120 characters.".to_string())
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

fn pipeline(index_dir: &Path) -> RagPipeline {
    RagPipeline::builder()
        .config(RagConfig::builder().chunk_size(30).chunk_overlap(5).build().unwrap())
        .embedding_provider(Arc::new(VowelEmbedder))
        .generator(Arc::new(FixedGenerator))
        .index_dir(index_dir)
        .build()
        .unwrap()
}

fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn ingest_then_query_prints_answer_and_sources() {
    let temp = tempfile::tempdir().unwrap();
    let data = temp.path().join("data");
    let index = temp.path().join("index");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("doc1.txt"), "Sentence one. Sentence two. Sentence three.").unwrap();
    fs::write(data.join("doc2.md"), format!("{}.", "x".repeat(250))).unwrap();

    let mut out = Vec::new();
    commands::ingest(&pipeline(&index), &data, &mut out).await.unwrap();
    let printed = output(out);
    assert!(printed.starts_with("Loaded 2 docs -> 3 chunks\n"));
    assert!(printed.contains(&format!("Saved index to {}", index.display())));

    let mut out = Vec::new();
    commands::query(&pipeline(&index), "How much do chunks overlap?", 5, &mut out).await.unwrap();
    let printed = output(out);
    assert!(printed.starts_with("\n=== Answer ===\nChunks overlap by 120 characters.\n"));
    assert!(printed.contains("\n=== Sources (top snippets) ===\n"));

    let sources: Vec<&str> = printed.lines().filter(|line| line.starts_with('[')).collect();
    assert_eq!(sources.len(), 3);
    assert!(sources[0].starts_with("[1] "));
    assert!(sources[2].starts_with("[3] "));
    let long = sources.iter().find(|line| line.contains("doc2.md")).unwrap();
    assert!(long.ends_with(&format!(":: {}...", "x".repeat(200))));
}

#[tokio::test]
async fn query_against_empty_index_prints_no_context() {
    let temp = tempfile::tempdir().unwrap();
    let index = temp.path().join("index");
    let empty = RagPipeline::builder()
        .embedding_provider(Arc::new(VowelEmbedder))
        .generator(Arc::new(FixedGenerator))
        .index_dir(&index)
        .build()
        .unwrap();
    let knowledge_base = empty.build_knowledge_base(&[]).await.unwrap();
    empty.store().save(&knowledge_base).await.unwrap();

    let mut out = Vec::new();
    commands::query(&pipeline(&index), "anything", 5, &mut out).await.unwrap();
    assert_eq!(output(out), format!("{NO_CONTEXT}\n"));
}

#[tokio::test]
async fn query_without_index_fails_with_actionable_message() {
    let temp = tempfile::tempdir().unwrap();
    let index = temp.path().join("missing");
    let cli = Cli::try_parse_from([
        "docqa",
        "--index-dir",
        index.to_str().unwrap(),
        "--api-key",
        "sk-test",
        "query",
        "--q",
        "What is overlap?",
    ])
    .unwrap();

    let mut out = Vec::new();
    let err = commands::run(cli, &mut out).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("index not found at {} — run ingest first", index.display())
    );
    assert!(out.is_empty());
}

#[tokio::test]
async fn overlap_not_smaller_than_chunk_size_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let cli = Cli::try_parse_from([
        "docqa",
        "--index-dir",
        temp.path().join("index").to_str().unwrap(),
        "ingest",
        "--data-dir",
        temp.path().to_str().unwrap(),
        "--chunk-size",
        "10",
        "--overlap",
        "10",
    ])
    .unwrap();

    let err = commands::run(cli, &mut Vec::<u8>::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "invalid ingest options");
    assert!(format!("{err:#}").contains("chunk_overlap (10) must be less than chunk_size (10)"));
}
