//! Resume document text extraction.
//!
//! Wraps `pdf-extract` with the guarantees the matching pipeline relies on:
//! page order is preserved, pages are joined with `\n`, a page without text
//! contributes an empty string, and anything that is not a readable PDF is
//! reported as `ExtractError::Unreadable`.

use thiserror::Error;
use tracing::debug;

/// PDF files may carry up to this many bytes of junk before the header.
const HEADER_SEARCH_WINDOW: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    Unreadable(String),
}

/// Returns true when the `%PDF-` header appears near the start of `bytes`.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Synchronous extraction. CPU-bound; async callers should use [`extract_pdf_text`].
pub fn extract_pdf_text_blocking(bytes: &[u8]) -> Result<String, ExtractError> {
    if !looks_like_pdf(bytes) {
        return Err(ExtractError::Unreadable("missing %PDF- header".to_string()));
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Unreadable(e.to_string()))?;

    debug!("Extracted text from {} PDF pages", pages.len());
    Ok(pages.join("\n"))
}

/// Extracts the text of every page on the blocking pool.
///
/// The underlying parser can panic on hostile input; a panicked task is
/// reported as an unreadable document instead of tearing down the request.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extract_pdf_text_blocking(&bytes))
        .await
        .map_err(|e| ExtractError::Unreadable(format!("PDF parser aborted: {e}")))?
}

/// Text of a stored resume: taken as-is when it is plain UTF-8 text,
/// otherwise run through the PDF extractor.
pub async fn extract_resume_text(bytes: Vec<u8>) -> Result<String, ExtractError> {
    if !looks_like_pdf(&bytes) {
        return String::from_utf8(bytes)
            .map_err(|_| ExtractError::Unreadable("neither a PDF nor UTF-8 text".to_string()));
    }
    extract_pdf_text(bytes).await
}
