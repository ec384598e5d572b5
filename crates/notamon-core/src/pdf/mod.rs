//! PDF processing module.

mod extractor;

pub use extractor::{list_pdfs, PdfExtractor, PdfFileSource};

use std::path::Path;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from a specific page (1-based).
    fn extract_page_text(&self, page: u32) -> Result<String>;
}

/// An opened document the pipeline reads page by page.
pub trait PageSource {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Plain text of a page (1-based). A failure only affects that page.
    fn page_text(&self, page: u32) -> Result<String>;
}

/// Opens documents by path.
pub trait DocumentSource {
    /// Open a document. A failure skips the whole document.
    fn open(&self, path: &Path) -> Result<Box<dyn PageSource>>;
}
