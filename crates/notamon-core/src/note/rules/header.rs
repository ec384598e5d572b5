//! Per-page header extraction (note number, sheet, date, client, advisor).

use chrono::NaiveDate;

use crate::models::note::PageHeader;

use super::patterns::{
    ADVISOR, CLIENT, CLIENT_CODE, CLIENT_CODE_DETAIL, CLIENT_NAME_BEFORE_BRANCH, NOTE_NUMBER,
    SHEET, TAX_ID, TRADE_DATE,
};

/// Width note numbers are zero-padded to.
pub const NOTE_NUMBER_WIDTH: usize = 7;

/// Page header extractor.
///
/// Extraction never fails: any field whose label is missing stays empty.
pub struct HeaderExtractor;

impl HeaderExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the header fields from one page of text.
    pub fn extract(&self, text: &str) -> PageHeader {
        let mut header = PageHeader::default();

        if let Some(caps) = NOTE_NUMBER.captures(text) {
            header.note_number = normalize_note_number(&caps[1], NOTE_NUMBER_WIDTH);
        }

        if let Some(caps) = SHEET.captures(text) {
            header.sheet = caps[1].trim().to_string();
        }

        if let Some(caps) = TRADE_DATE.captures(text) {
            header.trade_date = normalize_trade_date(caps[1].trim());
        }

        if let Some(caps) = CLIENT.captures(text) {
            header.client_code = caps[1].trim().to_string();
            header.client_name = collapse_whitespace(&caps[2]);
        }

        if header.client_code.is_empty() {
            if let Some(caps) = CLIENT_CODE.captures(text) {
                header.client_code = caps[1].trim().to_string();
            }
        }

        if header.client_name.is_empty() {
            if let Some(caps) = CLIENT_NAME_BEFORE_BRANCH.captures(text) {
                header.client_name = collapse_whitespace(&caps[1]);
            }
        }

        if let Some(m) = TAX_ID.find(text) {
            header.client_tax_id = m.as_str().to_string();
        }

        if let Some(caps) = CLIENT_CODE_DETAIL.captures(text) {
            header.client_code_detail = Some(caps[1].trim().to_string());
        }

        if let Some(caps) = ADVISOR.captures(text) {
            header.advisor = caps[1].trim().to_string();
        }

        header
    }
}

impl Default for HeaderExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the header fields from one page of text.
pub fn extract_header(text: &str) -> PageHeader {
    HeaderExtractor::new().extract(text)
}

/// Keep digits only and left-pad with zeros to `width`; longer values are kept.
pub fn normalize_note_number(raw: &str, width: usize) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    format!("{:0>width$}", digits, width = width)
}

/// `dd/mm/yyyy` to `yyyy-mm-dd`; text that is not a valid date is returned as is.
pub fn normalize_trade_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
