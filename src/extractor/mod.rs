#[cfg(test)]
mod tests;

use lopdf::Document;
use tracing::{debug, warn};

use crate::{DocqaError, Result};

/// Text pulled out of a page-structured document, in page order.
///
/// Pages that yield no extractable text (scanned or image-only pages)
/// contribute an empty string rather than failing the extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub pages: Vec<String>,
}

impl ExtractedDocument {
    /// The concatenated text of all pages, in page order.
    #[inline]
    pub fn text(&self) -> String {
        self.pages.concat()
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// Extract the textual content of a PDF from an in-memory byte buffer.
///
/// Fails with `DocqaError::Extraction` only when the bytes cannot be parsed
/// as a PDF at all. Per-page extraction failures degrade to empty pages.
#[inline]
pub fn extract_text(bytes: &[u8]) -> Result<ExtractedDocument> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| DocqaError::Extraction(format!("Failed to parse PDF: {}", e)))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!("Extracting text from {} pages", page_numbers.len());

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page_no in page_numbers {
        match doc.extract_text(&[page_no]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                warn!("No extractable text on page {}: {}", page_no, e);
                pages.push(String::new());
            }
        }
    }

    Ok(ExtractedDocument { pages })
}

/// Extract the textual content of a PDF file on disk.
#[inline]
pub fn extract_text_from_path(path: &std::path::Path) -> Result<ExtractedDocument> {
    let bytes = std::fs::read(path)?;
    extract_text(&bytes)
}
