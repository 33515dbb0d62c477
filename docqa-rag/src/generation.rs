//! Generator trait for producing answers from assembled prompts.

use async_trait::async_trait;

use crate::error::Result;

/// A text-generation backend.
///
/// Given a complete prompt, returns free-form text. Capping the output length
/// is the implementation's responsibility.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Return the model identifier.
    fn model_name(&self) -> &str;
}
