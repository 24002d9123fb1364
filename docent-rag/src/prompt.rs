//! Grounded prompt assembly.
//!
//! The rendered prompt structure is a contract: instructions before and
//! after the context section sit in fixed positions, so answer-quality
//! evaluation can rely on consistent placement. [`assemble_prompt`] is a
//! pure function of its inputs and is tested literally.

/// The grounding instruction used when the caller does not supply one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. \
Use the provided context to answer questions accurately and concisely. \
If the context does not contain enough information to answer the question, say so. \
Base your response only on the provided context.";

/// Width of the horizontal rules framing the context section.
const RULE_WIDTH: usize = 50;

/// Assemble the grounded prompt from an instruction, ranked context
/// passages, and the user's question.
///
/// Passages must be in retrieval rank order, most relevant first. Each
/// non-empty passage renders as a `Document N:` block; an empty passage is
/// omitted from the render but still advances the numbering, so block
/// numbers always reflect retrieval rank.
pub fn assemble_prompt(system_prompt: &str, passages: &[&str], question: &str) -> String {
    let blocks: Vec<String> = passages
        .iter()
        .enumerate()
        .filter(|(_, text)| !text.is_empty())
        .map(|(i, text)| format!("Document {}:\n{}", i + 1, text))
        .collect();
    let context = blocks.join("\n\n");
    let rule = "-".repeat(RULE_WIDTH);

    format!(
        "{system_prompt}\n\
         \n\
         Context Information:\n\
         {rule}\n\
         {context}\n\
         {rule}\n\
         \n\
         Question: {question}\n\
         \n\
         Instructions:\n\
         1. Read the context carefully\n\
         2. Answer the question based only on the provided context\n\
         3. If the context is insufficient, acknowledge this\n\
         4. Keep your response concise and focused\n\
         5. Include relevant citations from the provided documents\n\
         \n\
         Response:\n"
    )
}
