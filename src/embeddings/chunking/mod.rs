
use tracing::debug;

use crate::config::ChunkingConfig;
use crate::{DocqaError, Result};

/// A contiguous span of characters from the concatenated document text.
///
/// Immutable once produced. `start` and lengths are measured in characters
/// (Unicode scalar values), not bytes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Character offset of this chunk in the source text
    pub start: usize,
    /// Position of this chunk in the chunk sequence
    pub index: usize,
}

impl Chunk {
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split text into bounded, overlapping chunks with a sliding window.
///
/// Chunk `i` starts at `i * (max_chunk_size - overlap)` characters and takes
/// up to `max_chunk_size` characters, so adjacent chunks share `overlap`
/// characters verbatim. The walk stops once a chunk reaches the end of the
/// text. Empty input yields an empty sequence.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    validate(config)?;

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let stride = config.max_chunk_size - config.overlap;
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut index = 0;

    loop {
        let end = (start + config.max_chunk_size).min(chars.len());
        chunks.push(Chunk {
            text: chars[start..end].iter().collect(),
            start,
            index,
        });
        index += 1;

        if end == chars.len() {
            break;
        }
        start += stride;
    }

    debug!(
        "Chunked {} chars into {} chunks (max {}, overlap {})",
        chars.len(),
        chunks.len(),
        config.max_chunk_size,
        config.overlap
    );

    Ok(chunks)
}

/// Sentence-preserving variant of [`chunk_text`].
///
/// Accumulates whole sentences (split on terminal punctuation) until adding
/// the next sentence would exceed `max_chunk_size`. A single sentence longer
/// than `max_chunk_size` becomes an oversized chunk by itself; that is an
/// accepted edge case, not an error. No overlap is applied between chunks.
#[inline]
pub fn chunk_sentences(text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    validate(config)?;

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut chunk_start = 0;
    let mut chunk_len = 0;
    let mut index = 0;

    for (start, end) in sentence_spans(&chars) {
        let sentence_len = end - start;

        if chunk_len > 0 && chunk_len + sentence_len > config.max_chunk_size {
            chunks.push(Chunk {
                text: chars[chunk_start..chunk_start + chunk_len].iter().collect(),
                start: chunk_start,
                index,
            });
            index += 1;
            chunk_start = start;
            chunk_len = 0;
        }

        chunk_len += sentence_len;
    }

    if chunk_len > 0 {
        chunks.push(Chunk {
            text: chars[chunk_start..chunk_start + chunk_len].iter().collect(),
            start: chunk_start,
            index,
        });
    }

    Ok(chunks)
}

/// Split into verbatim sentence spans, each ending at terminal punctuation.
///
/// Spans partition the input exactly; whitespace after a terminator belongs
/// to the following sentence. Trailing text without a terminator forms a
/// final sentence.
fn sentence_spans(chars: &[char]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;

    for (i, c) in chars.iter().enumerate() {
        if matches!(c, '.' | '!' | '?') {
            spans.push((start, i + 1));
            start = i + 1;
        }
    }

    if start < chars.len() {
        spans.push((start, chars.len()));
    }

    spans
}

fn validate(config: &ChunkingConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| DocqaError::Config(e.to_string()))?;
    Ok(())
}
