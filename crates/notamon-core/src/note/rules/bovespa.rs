//! Cash-equity (BOVESPA) trade lines.
//!
//! Two renderings exist: the whole trade flattened on one line, or one field
//! per line with the description spread over several lines. The flattened
//! form is tried first; the multi-line scan only runs when it finds nothing.

use tracing::trace;

use crate::models::note::{Layout, RawOperation};

use super::amounts::{parse_br_amount, parse_quantity};
use super::legend::{decode_codes, is_observation_token};
use super::patterns::{BOVESPA_LINE, EQUITY_TICKER, INTEGER, TRADE_SEQUENCE};
use super::{page_lines, OperationParser};

/// Which rendering produced the operations of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BovespaStrategy {
    SingleLine,
    MultiLine,
}

/// Split a description by peeling single-code observation tokens off its end.
///
/// `"VISTA PETR4 D F"` becomes `("VISTA PETR4", "D F")`.
pub fn split_description(middle: &str) -> (String, String) {
    let normalized = middle.replace('\u{a0}', " ");
    let mut tokens: Vec<&str> = normalized.split_whitespace().collect();

    let mut observation = Vec::new();
    while let Some(last) = tokens.last() {
        if !is_observation_token(last) {
            break;
        }
        observation.push(*last);
        tokens.pop();
    }
    observation.reverse();

    (tokens.join(" "), observation.join(" "))
}

/// Last description token shaped like an equity ticker, uppercased.
pub fn resolve_ticker(description: &str) -> Option<String> {
    description
        .split_whitespace()
        .rev()
        .map(str::to_uppercase)
        .find(|token| EQUITY_TICKER.is_match(token))
}

/// Fields recovered for one trade before it becomes a [`RawOperation`].
#[derive(Debug, Default)]
struct TradeFields {
    sequence: String,
    side: String,
    market_type: String,
    description: String,
    observation: String,
    quantity: String,
    price: String,
    value: String,
    debit_credit: String,
}

impl TradeFields {
    fn into_operation(self, source_line: String) -> RawOperation {
        let mut op = RawOperation::new(Layout::Bovespa);

        op.asset = resolve_ticker(&self.description).unwrap_or_else(|| self.description.clone());
        op.observation_codes = decode_codes(&self.observation);
        op.quantity = parse_quantity(&self.quantity);
        op.price = parse_br_amount(&self.price);
        op.value = parse_br_amount(&self.value);

        op.trade_sequence = self.sequence;
        op.side = self.side;
        op.market_type = self.market_type;
        op.description = self.description;
        op.observation = self.observation;
        op.quantity_text = self.quantity;
        op.price_text = self.price;
        op.value_text = self.value;
        op.debit_credit = self.debit_credit;
        op.source_line = source_line;
        op
    }

    /// Provenance line for trades rebuilt from several lines.
    fn joined(&self) -> String {
        [
            self.sequence.as_str(),
            self.side.as_str(),
            self.market_type.as_str(),
            self.description.as_str(),
            self.observation.as_str(),
            self.quantity.as_str(),
            self.price.as_str(),
            self.value.as_str(),
            self.debit_credit.as_str(),
        ]
        .join(" | ")
    }
}

/// Flattened one-line trades.
pub struct SingleLineParser;

impl SingleLineParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_line(&self, line: &str) -> Option<RawOperation> {
        let normalized = line.replace('\u{a0}', " ");
        let caps = BOVESPA_LINE.captures(&normalized)?;

        let (description, observation) = split_description(caps["middle"].trim());

        let fields = TradeFields {
            sequence: caps["sequence"].to_string(),
            side: caps["side"].to_string(),
            market_type: caps["market"].to_string(),
            description,
            observation,
            quantity: caps["quantity"].to_string(),
            price: caps["price"].to_string(),
            value: caps["value"].to_string(),
            debit_credit: caps["dc"].to_string(),
        };

        trace!("single-line trade: {}", line);
        Some(fields.into_operation(line.to_string()))
    }
}

impl Default for SingleLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationParser for SingleLineParser {
    fn parse(&self, text: &str) -> Vec<RawOperation> {
        page_lines(text)
            .into_iter()
            .filter_map(|line| self.parse_line(line))
            .collect()
    }
}

/// Scanner state for the multi-line rendering.
#[derive(Debug)]
enum ScanState {
    /// Looking for a `<n>-BOVESPA` line at `at`.
    SeekingAnchor { at: usize },
    /// Anchor found; side and market type follow.
    ReadingHeaderFields { anchor: usize },
    /// Accumulating description/observation fragments until a quantity line.
    ReadingDescription {
        anchor: usize,
        cursor: usize,
        fields: TradeFields,
        description: Vec<String>,
        observation: Vec<String>,
    },
    /// Quantity, price, value and debit/credit start at `quantity_at`.
    ReadingTrailer {
        quantity_at: usize,
        fields: TradeFields,
    },
    Done,
}

/// One-field-per-line trades.
pub struct MultiLineParser;

impl MultiLineParser {
    pub fn new() -> Self {
        Self
    }

    fn is_anchor(line: &str) -> bool {
        let line = line.replace('\u{a0}', " ");
        let line = line.trim();
        TRADE_SEQUENCE.is_match(line) && line.contains("BOVESPA")
    }

    /// Run the scanner over trimmed, non-empty lines.
    ///
    /// A block whose trailer runs past the end of the page is dropped and the
    /// scan resumes on the line after its anchor.
    pub fn parse_lines(&self, lines: &[&str]) -> Vec<RawOperation> {
        let mut operations = Vec::new();
        let mut state = ScanState::SeekingAnchor { at: 0 };

        loop {
            state = match state {
                ScanState::SeekingAnchor { at } if at >= lines.len() => ScanState::Done,
                ScanState::SeekingAnchor { at } => {
                    if Self::is_anchor(lines[at]) {
                        ScanState::ReadingHeaderFields { anchor: at }
                    } else {
                        ScanState::SeekingAnchor { at: at + 1 }
                    }
                }
                ScanState::ReadingHeaderFields { anchor } => {
                    if anchor + 3 >= lines.len() {
                        ScanState::SeekingAnchor { at: anchor + 1 }
                    } else {
                        let fields = TradeFields {
                            sequence: lines[anchor].replace('\u{a0}', " ").trim().to_string(),
                            side: lines[anchor + 1].trim().to_string(),
                            market_type: lines[anchor + 2].trim().to_string(),
                            ..TradeFields::default()
                        };
                        ScanState::ReadingDescription {
                            anchor,
                            cursor: anchor + 3,
                            fields,
                            description: Vec::new(),
                            observation: Vec::new(),
                        }
                    }
                }
                ScanState::ReadingDescription {
                    anchor,
                    cursor,
                    mut fields,
                    mut description,
                    mut observation,
                } => {
                    if cursor < lines.len() && !INTEGER.is_match(lines[cursor].trim()) {
                        let fragment = lines[cursor].replace('\u{a0}', " ");
                        let fragment = fragment.trim();

                        if fragment.split_whitespace().count() == 1 && is_observation_token(fragment) {
                            observation.push(fragment.to_string());
                        } else {
                            let (desc, obs) = split_description(fragment);
                            if !desc.is_empty() {
                                description.push(desc);
                            }
                            if !obs.is_empty() {
                                observation.push(obs);
                            }
                        }

                        ScanState::ReadingDescription {
                            anchor,
                            cursor: cursor + 1,
                            fields,
                            description,
                            observation,
                        }
                    } else if cursor + 3 >= lines.len() {
                        trace!("incomplete block at line {}, skipping anchor", anchor);
                        ScanState::SeekingAnchor { at: anchor + 1 }
                    } else {
                        fields.description = description.join(" ").trim().to_string();
                        fields.observation = observation.join(" ").trim().to_string();
                        ScanState::ReadingTrailer {
                            quantity_at: cursor,
                            fields,
                        }
                    }
                }
                ScanState::ReadingTrailer {
                    quantity_at,
                    mut fields,
                } => {
                    fields.quantity = lines[quantity_at].trim().to_string();
                    fields.price = lines[quantity_at + 1].trim().to_string();
                    fields.value = lines[quantity_at + 2].trim().to_string();
                    fields.debit_credit = lines[quantity_at + 3].trim().to_string();

                    let source_line = fields.joined();
                    trace!("multi-line trade: {}", source_line);
                    operations.push(fields.into_operation(source_line));

                    ScanState::SeekingAnchor {
                        at: quantity_at + 4,
                    }
                }
                ScanState::Done => break,
            };
        }

        operations
    }
}

impl Default for MultiLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationParser for MultiLineParser {
    fn parse(&self, text: &str) -> Vec<RawOperation> {
        self.parse_lines(&page_lines(text))
    }
}

/// Cash-equity parser: single-line strategy, then multi-line.
pub struct BovespaLineParser {
    single: SingleLineParser,
    multi: MultiLineParser,
}

impl BovespaLineParser {
    pub fn new() -> Self {
        Self {
            single: SingleLineParser::new(),
            multi: MultiLineParser::new(),
        }
    }

    /// Operations of the first strategy that finds any, with that strategy.
    pub fn parse_with_strategy(&self, text: &str) -> Option<(BovespaStrategy, Vec<RawOperation>)> {
        let lines = page_lines(text);

        let single: Vec<RawOperation> = lines
            .iter()
            .filter_map(|line| self.single.parse_line(line))
            .collect();
        if !single.is_empty() {
            return Some((BovespaStrategy::SingleLine, single));
        }

        let multi = self.multi.parse_lines(&lines);
        if !multi.is_empty() {
            return Some((BovespaStrategy::MultiLine, multi));
        }

        None
    }
}

impl Default for BovespaLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationParser for BovespaLineParser {
    fn parse(&self, text: &str) -> Vec<RawOperation> {
        self.parse_with_strategy(text)
            .map(|(_, ops)| ops)
            .unwrap_or_default()
    }
}
