//! PDF page text extraction using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{DocumentSource, PageSource, PdfProcessor, Result};
use crate::error::PdfError;

/// PDF page text extractor.
///
/// Page texts come from pdf-extract when it handles the whole document,
/// otherwise each page is extracted on demand with lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    page_texts: Option<Vec<String>>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            page_texts: None,
        }
    }

    /// Load a PDF file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| PdfError::Parse(format!("cannot read {}: {}", path.display(), e)))?;
        let mut extractor = Self::new();
        extractor.load(&data)?;
        Ok(extractor)
    }

    /// Parse with lopdf, decrypting documents protected by an empty password.
    /// Returns the document and the bytes pdf-extract should read.
    fn parse_document(data: &[u8]) -> Result<(Document, Vec<u8>)> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if !doc.is_encrypted() {
            return Ok((doc, data.to_vec()));
        }

        if doc.decrypt("").is_err() {
            return Err(PdfError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
        Ok((doc, decrypted))
    }

    /// Layout-preserving text of every page, or `None` when pdf-extract
    /// fails or disagrees with lopdf on the page count.
    fn layout_texts(data: &[u8], expected_pages: usize) -> Option<Vec<String>> {
        // pdf-extract panics on some malformed fonts.
        let result = guarded(|| pdf_extract::extract_text_from_mem_by_pages(data));

        match result {
            Ok(Ok(pages)) if pages.len() == expected_pages => Some(pages),
            Ok(Ok(pages)) => {
                debug!(
                    "pdf-extract returned {} pages, expected {}; using per-page extraction",
                    pages.len(),
                    expected_pages
                );
                None
            }
            Ok(Err(e)) => {
                debug!("pdf-extract failed: {}; using per-page extraction", e);
                None
            }
            Err(msg) => {
                warn!("pdf-extract panicked: {}; using per-page extraction", msg);
                None
            }
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let (doc, raw_data) = guarded(|| Self::parse_document(data))
            .map_err(|msg| PdfError::Parse(format!("lopdf panicked: {}", msg)))??;

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        self.page_texts = Self::layout_texts(&raw_data, page_count);
        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self
            .document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))?;

        if page == 0 || page > PdfProcessor::page_count(self) {
            return Err(PdfError::InvalidPage(page));
        }

        if let Some(text) = self
            .page_texts
            .as_ref()
            .and_then(|texts| texts.get(page as usize - 1))
        {
            return Ok(text.clone());
        }

        trace!("lopdf text extraction for page {}", page);
        guarded(|| doc.extract_text(&[page]))
            .map_err(|msg| PdfError::TextExtraction(format!("page {}: lopdf panicked: {}", page, msg)))?
            .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", page, e)))
    }
}

impl PageSource for PdfExtractor {
    fn page_count(&self) -> u32 {
        PdfProcessor::page_count(self)
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.extract_page_text(page)
    }
}

/// Run `f`, turning a panic into its message. Both PDF libraries panic on
/// some malformed input.
fn guarded<T>(f: impl FnOnce() -> T) -> std::result::Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string())
    })
}

/// Opens PDF files from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfFileSource;

impl DocumentSource for PdfFileSource {
    fn open(&self, path: &Path) -> Result<Box<dyn PageSource>> {
        Ok(Box::new(PdfExtractor::open(path)?))
    }
}

/// PDF files directly inside `dir`, sorted by file name.
pub fn list_pdfs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
