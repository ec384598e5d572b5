//! Brokerage note data models: page headers, decoded operations and classified records.

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Note layout an operation was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    /// Cash-equity note.
    #[serde(rename = "BOVESPA")]
    Bovespa,
    /// Derivatives note.
    #[serde(rename = "BMF")]
    Bmf,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Bovespa => "BOVESPA",
            Layout::Bmf => "BMF",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity fields scoped to one page of a note.
///
/// Every field is best-effort: an empty string means the label was not
/// found on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    /// Note number, digits only, zero-padded to seven characters.
    pub note_number: String,

    /// Sheet ("Folha") number.
    pub sheet: String,

    /// Trading session date as `yyyy-mm-dd`, or the literal text when it
    /// could not be reformatted.
    pub trade_date: String,

    /// Client code.
    pub client_code: String,

    /// Client name.
    pub client_name: String,

    /// Client tax id (CPF, `ddd.ddd.ddd-dd`).
    pub client_tax_id: String,

    /// Advisor id.
    pub advisor: String,

    /// Rest of the "Código cliente" line, when present.
    pub client_code_detail: Option<String>,
}

/// Set of decoded observation codes, kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationCodes(BTreeSet<char>);

impl ObservationCodes {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, code: char) -> bool {
        self.0.insert(code)
    }

    pub fn contains(&self, code: char) -> bool {
        self.0.contains(&code)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Codes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    /// Space-joined sorted codes, e.g. `"D F"`.
    pub fn joined(&self) -> String {
        self.iter()
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<char> for ObservationCodes {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fields only derivatives (BMF) blocks carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BmfDetails {
    /// Commodity + maturity text as printed ("WDO F24").
    pub commodity: String,

    /// Maturity code (second token of the commodity text).
    pub maturity_code: String,

    /// Maturity date as printed.
    pub maturity_date: String,

    /// Trade type label, e.g. "DAY TRADE" or "NORMAL".
    pub trade_type: String,

    /// Operational fee as printed.
    pub fee_text: String,

    /// Operational fee, when the text parses.
    pub fee: Option<Decimal>,
}

/// One trade line or block decoded from page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOperation {
    /// Layout the operation came from.
    pub layout: Layout,

    /// Exchange sequence field ("1-BOVESPA"); empty for BMF.
    pub trade_sequence: String,

    /// Buy/sell indicator (`C` or `V`).
    pub side: String,

    /// Market segment label ("VISTA", "OPCAO DE COMPRA", "BM&F", ...).
    pub market_type: String,

    /// Asset description without trailing observation codes.
    pub description: String,

    /// Observation text as printed.
    pub observation: String,

    /// Decoded observation codes.
    pub observation_codes: ObservationCodes,

    /// Ticker or contract code; the full description when no ticker is found.
    pub asset: String,

    /// Quantity, when the text is a plain integer.
    pub quantity: Option<u64>,

    /// Quantity as printed.
    pub quantity_text: String,

    /// Price, when the text parses.
    pub price: Option<Decimal>,

    /// Price as printed.
    pub price_text: String,

    /// Financial value, when the text parses.
    pub value: Option<Decimal>,

    /// Financial value as printed.
    pub value_text: String,

    /// Debit/credit indicator (`D` or `C`).
    pub debit_credit: String,

    /// Verbatim source line, or the recovered fields joined with `" | "`.
    pub source_line: String,

    /// Derivatives-only fields.
    pub bmf: Option<BmfDetails>,
}

impl RawOperation {
    /// Empty operation of the given layout, filled in by the parsers.
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            trade_sequence: String::new(),
            side: String::new(),
            market_type: String::new(),
            description: String::new(),
            observation: String::new(),
            observation_codes: ObservationCodes::new(),
            asset: String::new(),
            quantity: None,
            quantity_text: String::new(),
            price: None,
            price_text: String::new(),
            value: None,
            value_text: String::new(),
            debit_credit: String::new(),
            source_line: String::new(),
            bmf: None,
        }
    }

    /// Quantity as it participates in the identity key.
    pub fn quantity_key(&self) -> String {
        match self.quantity {
            Some(q) => q.to_string(),
            None => self.quantity_text.clone(),
        }
    }

    /// BMF trade type, empty for BOVESPA operations.
    pub fn trade_type(&self) -> &str {
        self.bmf.as_ref().map(|b| b.trade_type.as_str()).unwrap_or("")
    }
}

/// A decoded operation merged with its page header and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Source document file name.
    pub document: String,

    /// Source page number (1-based).
    pub page: u32,

    /// Header of the page the operation was found on.
    pub header: PageHeader,

    /// The decoded operation.
    pub operation: RawOperation,

    /// Canonical identity key.
    pub identity_key: String,

    /// Hex digest of the identity key.
    pub operation_id: String,
}

/// Compliance flags derived from one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFlags {
    pub is_coverage: bool,
    pub is_day_trade: bool,
    pub is_mini_contract: bool,
    pub is_rate_futures: bool,
    pub is_option: bool,
    pub is_forward_market: bool,
    pub alert: bool,
}

/// An operation record with its compliance flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: OperationRecord,

    pub flags: ComplianceFlags,
}
