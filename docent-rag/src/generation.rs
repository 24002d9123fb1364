//! Answer model trait for grounded text generation.

use async_trait::async_trait;

use crate::error::Result;

/// A generative language model that completes a prompt.
///
/// The responder treats implementations as pure functions of the prompt: no
/// conversation state is carried across calls, and every piece of context
/// the model may use is embedded in the prompt string itself.
#[async_trait]
pub trait AnswerModel: Send + Sync {
    /// Generate a free-text completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// A short name identifying the model, used in logs and errors.
    fn name(&self) -> &str;
}
