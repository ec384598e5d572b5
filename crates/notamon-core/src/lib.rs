//! Core library for Brazilian brokerage note monitoring.
//!
//! This crate provides:
//! - PDF page text extraction
//! - Trade extraction from cash-equity (BOVESPA) and derivatives (BMF) notes
//! - Deterministic identity keys for deduplication across runs
//! - Compliance flags (day trade, mini contracts, rate futures, options, forward market)

pub mod compliance;
pub mod error;
pub mod models;
pub mod note;
pub mod pdf;
pub mod pipeline;

pub use compliance::{classify, classify_all, ClassificationEngine};
pub use error::{NotamonError, PdfError, Result};
pub use models::dataset::{dedupe_by_id, COLUMNS};
pub use models::note::{
    ClassifiedRecord, ComplianceFlags, Layout, OperationRecord, PageHeader, RawOperation,
};
pub use note::{NoteParser, PageExtraction, PageParser, Strategy};
pub use pdf::{DocumentSource, PageSource, PdfExtractor, PdfFileSource, PdfProcessor};
pub use pipeline::{BatchExtraction, DocumentExtraction, ExtractionPipeline};
