//! Brokerage note parsing: header fields and trade operations of one page.

mod parser;
pub mod rules;

pub use parser::{NoteParser, PageExtraction, Strategy};

/// Trait for page-level note parsers.
pub trait PageParser {
    /// Parse the header and operations of one page of text.
    fn parse_page(&self, text: &str) -> PageExtraction;
}
