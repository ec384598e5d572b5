//! Rule-based extractors for brokerage notes.

pub mod amounts;
pub mod bmf;
pub mod bovespa;
pub mod header;
pub mod identity;
pub mod legend;
pub mod patterns;

pub use amounts::{parse_br_amount, parse_quantity};
pub use bmf::BmfBlockParser;
pub use bovespa::{BovespaLineParser, BovespaStrategy, MultiLineParser, SingleLineParser};
pub use header::{extract_header, HeaderExtractor};
pub use identity::{build_key, derive_id};
pub use legend::{decode_codes, describe, tokenize};

use crate::models::note::RawOperation;

/// Trait for trade-line parsers.
pub trait OperationParser {
    /// Decode every trade found in one page of text, in page order.
    fn parse(&self, text: &str) -> Vec<RawOperation>;
}

/// Trimmed, non-empty lines of a page.
pub fn page_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}
