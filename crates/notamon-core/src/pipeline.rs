//! Batch extraction over documents and pages.
//!
//! Unreadable documents and pages are logged and skipped; the batch never
//! aborts for one bad input. Records keep document order, then page order,
//! then discovery order within a page.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::models::note::OperationRecord;
use crate::note::{NoteParser, PageParser};
use crate::pdf::{DocumentSource, PageSource};

/// Records extracted from one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtraction {
    /// Document name used for provenance.
    pub document: String,
    /// Pages the document reported.
    pub pages: u32,
    /// Pages whose text could not be read.
    pub failed_pages: u32,
    /// Records in page order.
    pub records: Vec<OperationRecord>,
}

/// Records extracted from a batch of documents.
#[derive(Debug, Clone, Default)]
pub struct BatchExtraction {
    /// Documents attempted.
    pub documents: usize,
    /// Documents that could not be opened.
    pub failed_documents: usize,
    /// Records across the batch, in document order.
    pub records: Vec<OperationRecord>,
}

impl BatchExtraction {
    /// Append one document's result, keeping document order.
    pub fn push(&mut self, extraction: Option<DocumentExtraction>) {
        self.documents += 1;
        match extraction {
            Some(doc) => self.records.extend(doc.records),
            None => self.failed_documents += 1,
        }
    }
}

impl FromIterator<Option<DocumentExtraction>> for BatchExtraction {
    fn from_iter<I: IntoIterator<Item = Option<DocumentExtraction>>>(iter: I) -> Self {
        let mut batch = BatchExtraction::default();
        for extraction in iter {
            batch.push(extraction);
        }
        batch
    }
}

/// Name recorded as a record's document: the file name of the path.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extraction pipeline from page text to identified operation records.
pub struct ExtractionPipeline<P: PageParser = NoteParser> {
    parser: P,
}

impl ExtractionPipeline<NoteParser> {
    pub fn new() -> Self {
        Self::with_parser(NoteParser::new())
    }
}

impl Default for ExtractionPipeline<NoteParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PageParser> ExtractionPipeline<P> {
    pub fn with_parser(parser: P) -> Self {
        Self { parser }
    }

    /// Records of one opened document.
    pub fn extract_document(&self, document: &str, source: &dyn PageSource) -> DocumentExtraction {
        let pages = source.page_count();
        let mut extraction = DocumentExtraction {
            document: document.to_string(),
            pages,
            ..DocumentExtraction::default()
        };

        for page in 1..=pages {
            let text = match source.page_text(page) {
                Ok(text) => text,
                Err(e) => {
                    warn!("{} page {}: skipped, {}", document, page, e);
                    extraction.failed_pages += 1;
                    continue;
                }
            };

            if text.trim().is_empty() {
                debug!("{} page {}: no text", document, page);
                continue;
            }

            let parsed = self.parser.parse_page(&text);
            for warning in &parsed.warnings {
                warn!("{} page {}: {}", document, page, warning);
            }
            debug!(
                "{} page {}: {} operations ({:?})",
                document,
                page,
                parsed.operations.len(),
                parsed.strategy
            );

            extraction.records.extend(
                parsed
                    .operations
                    .into_iter()
                    .map(|op| OperationRecord::new(document, page, parsed.header.clone(), op)),
            );
        }

        info!(
            "{}: {} pages, {} operations",
            document,
            pages,
            extraction.records.len()
        );
        extraction
    }

    /// Open and extract one document; `None` when it cannot be opened.
    pub fn extract_path<S: DocumentSource + ?Sized>(
        &self,
        source: &S,
        path: &Path,
    ) -> Option<DocumentExtraction> {
        let name = document_name(path);
        match source.open(path) {
            Ok(pages) => Some(self.extract_document(&name, pages.as_ref())),
            Err(e) => {
                warn!("{}: skipped, {}", name, e);
                None
            }
        }
    }

    /// Extract every document in order into one flat record list.
    pub fn extract_from_documents<S: DocumentSource + ?Sized>(
        &self,
        source: &S,
        paths: &[PathBuf],
    ) -> BatchExtraction {
        let batch: BatchExtraction = paths
            .iter()
            .map(|path| self.extract_path(source, path))
            .collect();

        info!(
            "batch: {} documents ({} failed), {} operations",
            batch.documents,
            batch.failed_documents,
            batch.records.len()
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use crate::pdf;
    use std::collections::HashMap;

    struct MemPages(Vec<Option<&'static str>>);

    impl PageSource for MemPages {
        fn page_count(&self) -> u32 {
            self.0.len() as u32
        }

        fn page_text(&self, page: u32) -> pdf::Result<String> {
            match self.0.get(page as usize - 1) {
                Some(Some(text)) => Ok(text.to_string()),
                Some(None) => Err(PdfError::TextExtraction("broken page".to_string())),
                None => Err(PdfError::InvalidPage(page)),
            }
        }
    }

    struct MemDocs(HashMap<&'static str, Vec<Option<&'static str>>>);

    impl DocumentSource for MemDocs {
        fn open(&self, path: &Path) -> pdf::Result<Box<dyn PageSource>> {
            let key = path.to_str().unwrap_or_default();
            self.0
                .get(key)
                .map(|pages| Box::new(MemPages(pages.clone())) as Box<dyn PageSource>)
                .ok_or_else(|| PdfError::Parse("corrupt".to_string()))
        }
    }

    const PAGE: &str = "Nr. nota 77\n1-BOVESPA C VISTA PETR4 100 25,50 2.550,00 D\n2-BOVESPA V VISTA VALE3 10 60,00 600,00 C\n";

    #[test]
    fn test_skips_broken_and_blank_pages() {
        let pages = MemPages(vec![None, Some("   \n"), Some(PAGE)]);
        let doc = ExtractionPipeline::new().extract_document("a.pdf", &pages);

        assert_eq!(doc.pages, 3);
        assert_eq!(doc.failed_pages, 1);
        assert_eq!(doc.records.len(), 2);
        assert!(doc.records.iter().all(|r| r.page == 3 && r.document == "a.pdf"));
        assert_eq!(doc.records[0].header.note_number, "0000077");
        assert_eq!(doc.records[1].operation.asset, "VALE3");
    }

    #[test]
    fn test_skips_unopenable_document() {
        let docs = MemDocs(HashMap::from([("dir/b.pdf", vec![Some(PAGE)])]));
        let paths = vec![PathBuf::from("dir/a.pdf"), PathBuf::from("dir/b.pdf")];

        let batch = ExtractionPipeline::new().extract_from_documents(&docs, &paths);
        assert_eq!(batch.documents, 2);
        assert_eq!(batch.failed_documents, 1);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].document, "b.pdf");
    }

    #[test]
    fn test_empty_batch() {
        let docs = MemDocs(HashMap::new());
        let batch = ExtractionPipeline::new().extract_from_documents(&docs, &[]);
        assert_eq!(batch.documents, 0);
        assert!(batch.records.is_empty());
    }
}
