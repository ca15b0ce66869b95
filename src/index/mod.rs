
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::embeddings::chunking::Chunk;
use crate::{DocqaError, Result};

/// Distance metric used for similarity search. Fixed per index and
/// serialized with it, so a reloaded index keeps comparing the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
}

impl DistanceMetric {
    /// Distance between two vectors of equal dimension; smaller is closer.
    fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexEntry {
    vector: Vec<f32>,
    chunk: Chunk,
}

/// A chunk returned from similarity search with its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Exact nearest-neighbor index over (vector, chunk) pairs.
///
/// Built once per document and queried many times; rebuilding replaces it
/// wholesale. Every vector must have the same dimension, which is pinned by
/// the first insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    metric: DistanceMetric,
    dimension: Option<usize>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    #[inline]
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            dimension: None,
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension pinned by the first inserted vector, if any.
    #[inline]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Insert a (vector, chunk) pair.
    ///
    /// The first insertion pins the index dimension; later vectors with a
    /// different dimension are rejected, since mixing embedding models
    /// invalidates similarity comparisons.
    #[inline]
    pub fn insert(&mut self, vector: Vec<f32>, chunk: Chunk) -> Result<()> {
        if vector.is_empty() {
            return Err(DocqaError::Index(
                "Cannot insert an empty vector".to_string(),
            ));
        }

        match self.dimension {
            None => self.dimension = Some(vector.len()),
            Some(dim) if dim != vector.len() => {
                return Err(DocqaError::Index(format!(
                    "Vector dimension {} does not match index dimension {}",
                    vector.len(),
                    dim
                )));
            }
            Some(_) => {}
        }

        self.entries.push(IndexEntry { vector, chunk });
        Ok(())
    }

    /// Return the `k` chunks closest to the query vector in ascending
    /// distance order, tie-broken by original insertion order. Asking for
    /// more results than the index holds returns everything.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if let Some(dim) = self.dimension {
            if query.len() != dim {
                return Err(DocqaError::Index(format!(
                    "Query dimension {} does not match index dimension {}",
                    query.len(),
                    dim
                )));
            }
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                distance: self.metric.distance(&entry.vector, query),
            })
            .collect();

        // Stable sort keeps insertion order for equal distances
        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        debug!("Search returned {} of {} entries", scored.len(), self.entries.len());
        Ok(scored)
    }

    /// Serialize the full set of (vector, chunk) pairs to disk.
    #[inline]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(self)
            .map_err(|e| DocqaError::Index(format!("Failed to serialize index: {}", e)))?;
        fs::write(path, json)?;

        info!("Saved index with {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Load a previously saved index.
    ///
    /// Queries against a reloaded index are only meaningful while the same
    /// embedding model remains configured.
    #[inline]
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let index: Self = serde_json::from_str(&json)
            .map_err(|e| DocqaError::Index(format!("Failed to parse index file: {}", e)))?;

        info!("Loaded index with {} entries from {}", index.entries.len(), path.display());
        Ok(index)
    }
}
