//! Derivatives (BMF) trade blocks.
//!
//! The derivatives note prints a column header ("C/V", "Mercadoria", ...)
//! one label per line, then each trade as a fixed stride of nine lines.

use tracing::trace;

use crate::models::note::{BmfDetails, Layout, RawOperation};

use super::amounts::{parse_br_amount, parse_quantity};
use super::patterns::INTEGER;
use super::OperationParser;

/// Lines per trade row, and the offset from the anchor to the first row.
pub const STRIDE: usize = 9;

/// Market type recorded for every derivatives trade.
pub const BMF_MARKET_TYPE: &str = "BM&F";

/// Derivatives block parser.
pub struct BmfBlockParser;

impl BmfBlockParser {
    pub fn new() -> Self {
        Self
    }

    /// Index of the "C/V" line opening the column header.
    pub fn find_anchor(lines: &[&str]) -> Option<usize> {
        (0..lines.len()).find(|&i| {
            lines[i] == "C/V"
                && i + 8 < lines.len()
                && lines[i + 1] == "Mercadoria"
                && lines[i + 2] == "Vencimento"
                && lines[i + 3] == "Quantidade"
                && lines[i + 4].contains("Preço")
                && lines[i + 5].contains("Tipo Negócio")
        })
    }

    /// Read rows in nine-line strides starting at `start`, stopping at the
    /// first stride that is not a trade.
    pub fn parse_rows(&self, lines: &[&str], start: usize) -> Vec<RawOperation> {
        let mut operations = Vec::new();
        let mut at = start;

        while at + 8 < lines.len() {
            let row = &lines[at..at + STRIDE];
            match Self::parse_row(row) {
                Some(op) => operations.push(op),
                None => break,
            }
            at += STRIDE;
        }

        operations
    }

    fn parse_row(row: &[&str]) -> Option<RawOperation> {
        let side = row[0];
        if side.is_empty() || side.to_uppercase().starts_with("NOTA DE NEGOCIA") {
            return None;
        }

        let [_, commodity, maturity_date, quantity, price, trade_type, value, debit_credit, fee] =
            row
        else {
            return None;
        };

        if side != "C" && side != "V" {
            return None;
        }
        if !INTEGER.is_match(quantity) {
            return None;
        }

        let mut tokens = commodity.split_whitespace();
        let contract = tokens
            .next()
            .map(str::to_uppercase)
            .unwrap_or_else(|| commodity.to_uppercase());
        let maturity_code = tokens.next().map(str::to_uppercase).unwrap_or_default();

        let source_line = row.join(" | ");
        trace!("bmf trade: {}", source_line);

        let mut op = RawOperation::new(Layout::Bmf);
        op.side = side.to_string();
        op.market_type = BMF_MARKET_TYPE.to_string();
        op.description = format!("{} {} {}", commodity, maturity_date, trade_type)
            .trim()
            .to_string();
        op.asset = contract;
        op.quantity = parse_quantity(quantity);
        op.quantity_text = quantity.to_string();
        op.price = parse_br_amount(price);
        op.price_text = price.to_string();
        op.value = parse_br_amount(value);
        op.value_text = value.to_string();
        op.debit_credit = debit_credit.to_string();
        op.source_line = source_line;
        op.bmf = Some(BmfDetails {
            commodity: commodity.to_string(),
            maturity_code,
            maturity_date: maturity_date.to_string(),
            trade_type: trade_type.to_string(),
            fee_text: fee.to_string(),
            fee: parse_br_amount(fee),
        });

        Some(op)
    }

    /// Parse already split, trimmed lines (blank lines included).
    pub fn parse_lines(&self, lines: &[&str]) -> Vec<RawOperation> {
        match Self::find_anchor(lines) {
            Some(anchor) => self.parse_rows(lines, anchor + STRIDE),
            None => Vec::new(),
        }
    }
}

impl Default for BmfBlockParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationParser for BmfBlockParser {
    fn parse(&self, text: &str) -> Vec<RawOperation> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        self.parse_lines(&lines)
    }
}
