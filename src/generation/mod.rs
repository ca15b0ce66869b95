
pub mod ollama;

use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::embeddings::chunking::Chunk;
use crate::{DocqaError, Result};

/// Capability that turns a prompt into generated text.
///
/// Implementations must fail with `DocqaError::Generation` on service errors
/// and on empty responses; a blank success is never returned.
pub trait GenerativeModel {
    fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String>;
}

/// The task a prompt asks the model to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskInstruction {
    Summarize,
    AnswerQuestion,
    ExtractKeywords,
}

impl TaskInstruction {
    fn text(self) -> &'static str {
        match self {
            TaskInstruction::Summarize => "Summarize this document in bullet points:",
            TaskInstruction::AnswerQuestion => "Answer based only on this document:",
            TaskInstruction::ExtractKeywords => {
                "List the most important keywords of this document, one per line:"
            }
        }
    }
}

/// Keep the first `budget` characters of `text`.
///
/// Never exceeds the budget, for any input length including 0 and exactly at
/// the boundary. Counts characters, not bytes.
#[inline]
pub fn truncate_chars(text: &str, budget: usize) -> String {
    text.chars().take(budget).collect()
}

/// Compose a bounded prompt: fixed instruction, context truncated to the
/// character budget, and an optional user question.
#[inline]
pub fn build_prompt(
    task: TaskInstruction,
    context: &str,
    question: Option<&str>,
    context_budget: usize,
) -> String {
    let context = truncate_chars(context, context_budget);
    match question {
        Some(question) => format!("{}\n{}\nQuestion:{}", task.text(), context, question),
        None => format!("{}\n{}", task.text(), context),
    }
}

/// Drives a generative model for the three document tasks, enforcing the
/// context budget before every submission.
pub struct AnswerGenerator<G: GenerativeModel> {
    model: G,
    config: GenerationConfig,
}

impl<G: GenerativeModel> AnswerGenerator<G> {
    #[inline]
    pub fn new(model: G, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    /// Map-reduce summarization over a chunk sequence.
    ///
    /// Summarizes each of up to `map_chunk_limit` leading chunks
    /// independently, then summarizes the concatenated partial summaries.
    /// Issues exactly `min(map_chunk_limit, chunks.len()) + 1` generation
    /// calls regardless of document length.
    #[inline]
    pub fn summarize_chunks(&self, chunks: &[Chunk]) -> Result<String> {
        let map_count = self.config.map_chunk_limit.min(chunks.len());
        let mut partials = Vec::with_capacity(map_count);

        for chunk in &chunks[..map_count] {
            debug!("Summarizing chunk {} ({} chars)", chunk.index, chunk.len_chars());
            partials.push(self.run(TaskInstruction::Summarize, &chunk.text, None)?);
        }

        let combined = partials.join("\n\n");
        info!(
            "Reducing {} partial summaries into the final summary",
            partials.len()
        );
        self.run(TaskInstruction::Summarize, &combined, None)
    }

    /// Single-shot summarization of raw text, truncated to the budget.
    #[inline]
    pub fn summarize_text(&self, text: &str) -> Result<String> {
        self.run(TaskInstruction::Summarize, text, None)
    }

    /// Answer a question over the given context (retrieved chunks joined,
    /// or raw truncated document text).
    #[inline]
    pub fn answer(&self, context: &str, question: &str) -> Result<String> {
        self.run(TaskInstruction::AnswerQuestion, context, Some(question))
    }

    /// Extract keywords from the given text.
    #[inline]
    pub fn extract_keywords(&self, text: &str) -> Result<String> {
        self.run(TaskInstruction::ExtractKeywords, text, None)
    }

    fn run(&self, task: TaskInstruction, context: &str, question: Option<&str>) -> Result<String> {
        let prompt = build_prompt(task, context, question, self.config.max_context_chars);
        let output = self
            .model
            .generate(&prompt, self.config.max_output_tokens)?;

        if output.trim().is_empty() {
            return Err(DocqaError::Generation(
                "Model returned empty content".to_string(),
            ));
        }

        Ok(output)
    }
}
