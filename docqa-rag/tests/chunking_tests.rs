//! Property tests for sentence chunking.

use docqa_rag::chunking::{chunk_text, split_sentences};
use proptest::prelude::*;

/// Whitespace-normalized text made of short sentences.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-zA-Zé]{1,10}( [a-zA-Zé]{1,10}){0,6}[.?!]", 1..15)
        .prop_map(|sentences| sentences.join(" "))
}

/// The last `n` characters of `text`.
fn tail(text: &str, n: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars[chars.len().saturating_sub(n)..].iter().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn short_text_is_one_unchanged_chunk(text in arb_text()) {
        let chunk_size = text.chars().count() + 1;
        prop_assert_eq!(chunk_text(&text, chunk_size, 10), vec![text.clone()]);
    }

    #[test]
    fn each_chunk_starts_with_tail_of_previous(
        text in arb_text(),
        chunk_size in 10usize..120,
        overlap_seed in 1usize..1000,
    ) {
        let overlap = 1 + overlap_seed % (chunk_size - 1);
        let chunks = chunk_text(&text, chunk_size, overlap);

        for pair in chunks.windows(2) {
            let expected = tail(&pair[0], overlap);
            prop_assert!(
                pair[1].starts_with(expected.trim_start()),
                "{:?} does not start with tail {:?}",
                pair[1],
                expected,
            );
        }
    }

    #[test]
    fn pieces_keep_their_order(
        text in arb_text(),
        chunk_size in 10usize..120,
        overlap in 0usize..10,
    ) {
        let chunks = chunk_text(&text, chunk_size, overlap);
        let joined = chunks.join("\n");

        let mut cursor = 0;
        for piece in split_sentences(&text) {
            let found = joined[cursor..].find(piece);
            prop_assert!(found.is_some(), "piece {:?} missing or out of order", piece);
            cursor += found.unwrap_or_default() + piece.len();
        }
    }

    #[test]
    fn chunks_fit_unless_a_single_piece_is_oversized(
        text in arb_text(),
        chunk_size in 10usize..120,
    ) {
        let longest_piece =
            split_sentences(&text).iter().map(|p| p.chars().count()).max().unwrap_or(0);
        for chunk in chunk_text(&text, chunk_size, 0) {
            prop_assert!(chunk.chars().count() <= chunk_size.max(longest_piece));
        }
    }
}

#[test]
fn two_document_scenario() {
    let doc1 = chunk_text("Sentence one. Sentence two. Sentence three.", 30, 5);
    let doc2 = chunk_text("Another document here.", 30, 5);

    assert!(doc1.len() >= 2);
    for pair in doc1.windows(2) {
        assert!(pair[1].starts_with(tail(&pair[0], 5).trim_start()));
    }
    assert_eq!(doc2, vec!["Another document here.".to_string()]);
}
