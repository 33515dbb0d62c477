//! Prompt assembly under a character budget.
//!
//! The template is a fixed contract with the generator: an instruction to
//! answer only from context, the context block, the question, and an
//! `Answer:` cue.

use crate::config::DEFAULT_MAX_CONTEXT_CHARS;
use crate::document::RetrievedContext;

const INSTRUCTION: &str = "You are a helpful assistant. Answer the question **only** using the \
context below. If the answer isn't in the context, say you don't know.";

/// Builds generation prompts from retrieved contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptAssembler {
    max_chars: usize,
}

impl PromptAssembler {
    /// Create an assembler that admits at most `max_chars` characters of chunk text.
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// The chunk-text budget in characters.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Build the prompt for `question` from `contexts`.
    pub fn build(&self, contexts: &[RetrievedContext], question: &str) -> String {
        build_prompt(contexts, question, self.max_chars)
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_CHARS)
    }
}

/// Build a prompt from contexts in the order given.
///
/// Chunks are admitted whole while the running total of their character
/// lengths stays within `max_chars`; the first chunk that would exceed it
/// ends the context block. The template and question do not count against
/// the budget.
pub fn build_prompt(contexts: &[RetrievedContext], question: &str, max_chars: usize) -> String {
    let block = budgeted_texts(contexts, max_chars)
        .iter()
        .map(|text| format!("- {text}"))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{INSTRUCTION}\n\nContext:\n{block}\n\nQuestion: {question}\nAnswer:")
}

/// The leading chunk texts whose combined length fits in `max_chars`.
pub fn budgeted_texts(contexts: &[RetrievedContext], max_chars: usize) -> Vec<&str> {
    let mut total = 0;
    let mut included = Vec::new();
    for context in contexts {
        let len = context.text.chars().count();
        if total + len > max_chars {
            break;
        }
        total += len;
        included.push(context.text.as_str());
    }
    included
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(text: &str) -> RetrievedContext {
        RetrievedContext { text: text.to_string(), source_id: "s".into(), score: 1.0, position: 0 }
    }

    #[test]
    fn renders_fixed_template() {
        let prompt = build_prompt(&[ctx("alpha"), ctx("beta")], "What?", 100);
        assert_eq!(
            prompt,
            "You are a helpful assistant. Answer the question **only** using the context below. \
             If the answer isn't in the context, say you don't know.\n\n\
             Context:\n- alpha\n\n- beta\n\nQuestion: What?\nAnswer:"
        );
    }

    #[test]
    fn stops_at_first_chunk_that_overflows() {
        let contexts = [ctx("aaaa"), ctx("bbbbbbbb"), ctx("c")];
        assert_eq!(budgeted_texts(&contexts, 10), vec!["aaaa"]);
    }

    #[test]
    fn budget_is_inclusive() {
        let contexts = [ctx("aaaa"), ctx("bbbbbb")];
        assert_eq!(budgeted_texts(&contexts, 10), vec!["aaaa", "bbbbbb"]);
    }

    #[test]
    fn oversized_first_chunk_leaves_empty_context() {
        let prompt = build_prompt(&[ctx(&"z".repeat(20))], "Q", 10);
        assert!(prompt.contains("Context:\n\n\nQuestion: Q"));
        assert!(!prompt.contains('z'));
    }

    #[test]
    fn assembler_uses_configured_budget() {
        let assembler = PromptAssembler::new(5);
        let prompt = assembler.build(&[ctx("12345"), ctx("6")], "Q");
        assert!(prompt.contains("- 12345"));
        assert!(!prompt.contains("- 6"));
    }
}
