
use tracing::{debug, info};

use crate::embeddings::Embedder;
use crate::embeddings::chunking::Chunk;
use crate::index::{DistanceMetric, ScoredChunk, VectorIndex};
use crate::Result;

/// Builds similarity indexes from chunk sequences and answers queries
/// against them, using a pluggable embedding capability.
pub struct DocumentIndexer<E: Embedder> {
    embedder: E,
    metric: DistanceMetric,
}

impl<E: Embedder> DocumentIndexer<E> {
    #[inline]
    pub fn new(embedder: E, metric: DistanceMetric) -> Self {
        Self { embedder, metric }
    }

    /// Embed every chunk and insert the (vector, chunk) pairs in order.
    ///
    /// An empty chunk sequence builds an empty index. Embedding failures
    /// (after the client's retry budget) abort the build and surface as
    /// `DocqaError::EmbeddingService`.
    #[inline]
    pub fn build_index(&self, chunks: &[Chunk]) -> Result<VectorIndex> {
        let mut index = VectorIndex::new(self.metric);

        if chunks.is_empty() {
            debug!("No chunks to index, building empty index");
            return Ok(index);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        for (vector, chunk) in vectors.into_iter().zip(chunks.iter()) {
            index.insert(vector, chunk.clone())?;
        }

        info!(
            "Built index with {} chunks ({:?} dimensions)",
            index.len(),
            index.dimension()
        );
        Ok(index)
    }

    /// Embed the query and return the `k` closest chunks in ascending
    /// distance order.
    #[inline]
    pub fn retrieve(&self, index: &VectorIndex, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query)?;
        index.search(&query_vector, k)
    }
}
