// Embedding module
// Chunking of raw text plus the embedding capability used to vectorize chunks

pub mod chunking;
pub mod ollama;

use crate::Result;

/// Capability that turns text into a fixed-dimension vector.
///
/// One index must be fed by exactly one embedder; mixing models invalidates
/// similarity comparisons.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
