#[cfg(test)]
mod tests;

use std::sync::Mutex;
use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::chunking::{self, Chunk};
use crate::embeddings::Embedder;
use crate::extractor;
use crate::generation::{AnswerGenerator, GenerativeModel};
use crate::index::{ScoredChunk, VectorIndex};
use crate::indexer::DocumentIndexer;
use crate::{DocqaError, Result};

/// Linear document pipeline: extract, chunk, embed, retrieve, generate.
///
/// Each invocation owns its document, chunks, and index; nothing is shared
/// between invocations except the on-disk snapshot, which is single-writer
/// behind `index_lock`. The first failing stage aborts the rest.
pub struct QaPipeline<E: Embedder, G: GenerativeModel> {
    config: Config,
    indexer: DocumentIndexer<E>,
    generator: AnswerGenerator<G>,
    index_lock: Mutex<()>,
}

impl<E: Embedder, G: GenerativeModel> QaPipeline<E, G> {
    #[inline]
    pub fn new(config: Config, embedder: E, model: G) -> Self {
        let indexer = DocumentIndexer::new(embedder, config.retrieval.metric);
        let generator = AnswerGenerator::new(model, config.generation);

        Self {
            config,
            indexer,
            generator,
            index_lock: Mutex::new(()),
        }
    }

    /// Map-reduce summarization of a PDF document.
    #[inline]
    pub fn summarize(&self, pdf_bytes: &[u8]) -> Result<String> {
        let chunks = self.extract_and_chunk(pdf_bytes)?;
        self.generator.summarize_chunks(&chunks)
    }

    /// Answer a question about a PDF document: chunk it, build a throwaway
    /// index, retrieve the closest chunks, and generate over them.
    #[inline]
    pub fn answer(&self, pdf_bytes: &[u8], question: &str) -> Result<String> {
        let chunks = self.extract_and_chunk(pdf_bytes)?;
        let index = self.indexer.build_index(&chunks)?;
        let scored = self
            .indexer
            .retrieve(&index, question, self.config.retrieval.top_k)?;

        debug!("Retrieved {} chunks for question", scored.len());
        self.generator.answer(&join_context(&scored), question)
    }

    /// Extract keywords from a PDF document. The context budget is applied
    /// at prompt assembly, so the whole text is handed over as-is.
    #[inline]
    pub fn keywords(&self, pdf_bytes: &[u8]) -> Result<String> {
        let text = self.extract(pdf_bytes)?;
        self.generator.extract_keywords(&text)
    }

    /// Chunk and embed a PDF document, replacing the on-disk index snapshot
    /// wholesale. Returns the number of chunks indexed.
    #[inline]
    pub fn build_persistent_index(&self, pdf_bytes: &[u8]) -> Result<usize> {
        let chunks = self.extract_and_chunk(pdf_bytes)?;
        let index = self.indexer.build_index(&chunks)?;

        let _guard = self.lock_index()?;
        index.save(&self.config.index_path())?;
        info!(
            "Persisted index with {} chunks to {}",
            index.len(),
            self.config.index_path().display()
        );

        Ok(index.len())
    }

    /// Answer a question against the persisted index snapshot. Assumes the
    /// same embedding model is still configured as when the snapshot was
    /// built.
    #[inline]
    pub fn query_persistent_index(&self, question: &str) -> Result<String> {
        let index = {
            let _guard = self.lock_index()?;
            VectorIndex::load(&self.config.index_path())?
        };

        let scored = self
            .indexer
            .retrieve(&index, question, self.config.retrieval.top_k)?;

        if scored.is_empty() {
            return Err(DocqaError::Index(
                "The persisted index is empty; index a document first".to_string(),
            ));
        }

        self.generator.answer(&join_context(&scored), question)
    }

    fn extract(&self, pdf_bytes: &[u8]) -> Result<String> {
        let extracted = extractor::extract_text(pdf_bytes)?;
        if extracted.is_empty() {
            return Err(DocqaError::Extraction(
                "Document contains no extractable text".to_string(),
            ));
        }

        Ok(extracted.text())
    }

    fn extract_and_chunk(&self, pdf_bytes: &[u8]) -> Result<Vec<Chunk>> {
        let text = self.extract(pdf_bytes)?;
        let chunks = chunking::chunk_text(&text, &self.config.chunking)?;
        debug!("Chunked document into {} chunks", chunks.len());

        Ok(chunks)
    }

    fn lock_index(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.index_lock
            .lock()
            .map_err(|_| DocqaError::Index("Index lock poisoned".to_string()))
    }
}

fn join_context(scored: &[ScoredChunk]) -> String {
    scored
        .iter()
        .map(|s| s.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
