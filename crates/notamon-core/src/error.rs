//! Error types for the notamon-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the notamon library.
///
/// Only structural problems surface here. Field misses, unrecognised
/// layouts and malformed numbers are absorbed by the extractors.
#[derive(Error, Debug)]
pub enum NotamonError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The directory holding the notes does not exist.
    #[error("input directory does not exist: {}", .0.display())]
    InputDirMissing(PathBuf),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Result type for the notamon library.
pub type Result<T> = std::result::Result<T, NotamonError>;
