//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`SentenceChunker`], a greedy
//! packer that splits text at naive sentence boundaries and carries a raw
//! character overlap from each chunk into the next.
//!
//! All lengths are counted in characters, not bytes.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::document::{Chunk, Document};

/// Sentence terminator followed by the whitespace run that ends the sentence.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.?!]\s+").expect("sentence boundary pattern is valid"));

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks, in document order.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Packs sentence-like pieces into chunks of at most `chunk_size` characters,
/// repeating the last `overlap` characters of each chunk at the start of the
/// next.
///
/// A single piece longer than `chunk_size` is emitted whole rather than split,
/// so `chunk_size` is a soft bound.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Chunker, Document, SentenceChunker};
///
/// let chunker = SentenceChunker::new(800, 120);
/// let chunks = chunker.chunk(&Document::new("notes.txt", text));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceChunker {
    chunk_size: usize,
    overlap: usize,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk (soft)
    /// * `overlap` — number of trailing characters carried into the next chunk
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap }
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        chunk_text(&document.text, self.chunk_size, self.overlap)
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk { text, source_id: document.source_id.clone(), ordinal })
            .collect()
    }
}

/// Split text after every `.`, `?` or `!` that is followed by whitespace.
///
/// The whitespace run is dropped. Text without such a boundary is returned as
/// a single piece.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // The terminator is a single ASCII byte.
        pieces.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    pieces.push(&text[start..]);

    pieces
}

/// Split text into overlapping chunks of roughly `chunk_size` characters.
///
/// Pieces from [`split_sentences`] are joined with single spaces while the
/// result stays within `chunk_size`. When the next piece would overflow, the
/// current chunk is closed and the next one is seeded with the last `overlap`
/// characters of the closed chunk followed by the piece. The overlap is taken
/// in raw characters and may start mid-word.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for piece in split_sentences(text) {
        let piece_len = piece.chars().count();
        if current.chars().count() + piece_len + 1 <= chunk_size {
            current = join_trimmed(&current, piece);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current = match chunks.last() {
            Some(previous) if overlap > 0 => join_trimmed(tail_chars(previous, overlap), piece),
            _ => piece.to_string(),
        };
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// `"{head} {piece}"` with surrounding whitespace removed.
fn join_trimmed(head: &str, piece: &str) -> String {
    format!("{head} {piece}").trim().to_string()
}

/// The last `n` characters of `text`, or all of it when shorter.
fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_after_terminal_punctuation_and_whitespace() {
        let pieces = split_sentences("One. Two?  Three!\nFour");
        assert_eq!(pieces, vec!["One.", "Two?", "Three!", "Four"]);
    }

    #[test]
    fn punctuation_without_whitespace_is_not_a_boundary() {
        assert_eq!(split_sentences("v1.2 is out"), vec!["v1.2 is out"]);
        assert_eq!(split_sentences("ends here."), vec!["ends here."]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 800, 120).is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let text = "A short note. Nothing more.";
        assert_eq!(chunk_text(text, 800, 120), vec![text.to_string()]);
    }

    #[test]
    fn carries_overlap_into_next_chunk() {
        let chunks = chunk_text("Sentence one. Sentence two. Sentence three.", 30, 5);
        assert_eq!(chunks, vec!["Sentence one. Sentence two.", "two. Sentence three."]);
    }

    #[test]
    fn zero_overlap_starts_fresh() {
        let chunks = chunk_text("Sentence one. Sentence two. Sentence three.", 30, 0);
        assert_eq!(chunks, vec!["Sentence one. Sentence two.", "Sentence three."]);
    }

    #[test]
    fn oversized_piece_is_emitted_whole() {
        let long = "x".repeat(50);
        let text = format!("Short. {long}. Tail.");
        let chunks = chunk_text(&text, 20, 0);
        assert_eq!(chunks, vec!["Short.".to_string(), format!("{long}."), "Tail.".to_string()]);
    }

    #[test]
    fn overlap_counts_characters_not_bytes() {
        let chunks = chunk_text("Ünïcödé wörds. Möre wörds hère.", 20, 3);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].starts_with("ds. "));
    }

    #[test]
    fn tail_chars_handles_short_and_empty() {
        assert_eq!(tail_chars("abc", 5), "abc");
        assert_eq!(tail_chars("abc", 2), "bc");
        assert_eq!(tail_chars("abc", 0), "");
        assert_eq!(tail_chars("ééé", 1), "é");
    }

    #[test]
    fn chunker_assigns_ordinals_and_source() {
        let doc = Document::new("doc1.txt", "Sentence one. Sentence two. Sentence three.");
        let chunks = SentenceChunker::new(30, 5).chunk(&doc);
        assert_eq!(chunks.len(), 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, i);
            assert_eq!(chunk.source_id, "doc1.txt");
        }
    }
}
