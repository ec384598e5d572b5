//! Page-level layout routing: header plus the operations of the first layout that matches.

use tracing::debug;

use crate::models::note::{PageHeader, RawOperation};

use super::rules::{
    bmf::BmfBlockParser,
    bovespa::{BovespaLineParser, BovespaStrategy},
    header::HeaderExtractor,
    OperationParser,
};
use super::PageParser;

/// Strategy that produced a page's operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    BovespaSingleLine,
    BovespaMultiLine,
    BmfBlock,
}

impl From<BovespaStrategy> for Strategy {
    fn from(s: BovespaStrategy) -> Self {
        match s {
            BovespaStrategy::SingleLine => Strategy::BovespaSingleLine,
            BovespaStrategy::MultiLine => Strategy::BovespaMultiLine,
        }
    }
}

/// Result of parsing one page.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    /// Header fields of the page.
    pub header: PageHeader,
    /// Operations in discovery order.
    pub operations: Vec<RawOperation>,
    /// Strategy that matched, `None` when the page has no trades.
    pub strategy: Option<Strategy>,
    /// Fields whose literal text did not parse as a number.
    pub warnings: Vec<String>,
}

/// Layout router over the BOVESPA and BMF parsers.
pub struct NoteParser {
    header: HeaderExtractor,
    bovespa: BovespaLineParser,
    bmf: BmfBlockParser,
}

impl NoteParser {
    pub fn new() -> Self {
        Self {
            header: HeaderExtractor::new(),
            bovespa: BovespaLineParser::new(),
            bmf: BmfBlockParser::new(),
        }
    }

    /// Operations of a page: BOVESPA if any, else BMF, else none.
    pub fn extract_page_operations(&self, text: &str) -> Vec<RawOperation> {
        self.route(text).1
    }

    fn route(&self, text: &str) -> (Option<Strategy>, Vec<RawOperation>) {
        if let Some((strategy, ops)) = self.bovespa.parse_with_strategy(text) {
            return (Some(strategy.into()), ops);
        }

        let ops = self.bmf.parse(text);
        if !ops.is_empty() {
            return (Some(Strategy::BmfBlock), ops);
        }

        (None, Vec::new())
    }
}

impl Default for NoteParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PageParser for NoteParser {
    fn parse_page(&self, text: &str) -> PageExtraction {
        let header = self.header.extract(text);
        let (strategy, operations) = self.route(text);
        let warnings = numeric_warnings(&operations);

        debug!(
            "page parsed: strategy={:?}, {} operations, note={}",
            strategy,
            operations.len(),
            header.note_number
        );

        PageExtraction {
            header,
            operations,
            strategy,
            warnings,
        }
    }
}

fn numeric_warnings(operations: &[RawOperation]) -> Vec<String> {
    let mut warnings = Vec::new();

    for (idx, op) in operations.iter().enumerate() {
        let mut check = |field: &str, text: &str, parsed: bool| {
            if !parsed && !text.is_empty() {
                warnings.push(format!("operation {}: {} '{}' is not a number", idx + 1, field, text));
            }
        };

        check("quantity", &op.quantity_text, op.quantity.is_some());
        check("price", &op.price_text, op.price.is_some());
        check("value", &op.value_text, op.value.is_some());
        if let Some(bmf) = &op.bmf {
            check("fee", &bmf.fee_text, bmf.fee.is_some());
        }
    }

    warnings
}
