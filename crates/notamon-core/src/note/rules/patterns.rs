//! Common regex patterns for brokerage note extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Page header labels
    pub static ref NOTE_NUMBER: Regex = Regex::new(
        r"(?i)Nr\.?\s*nota\s+(\d[\d.]*)"
    ).unwrap();

    pub static ref SHEET: Regex = Regex::new(
        r"(?i)Folha\s+(\d+)"
    ).unwrap();

    pub static ref TRADE_DATE: Regex = Regex::new(
        r"(?i)Data\s+preg[aã]o\s+([0-3]\d/[01]\d/\d{4})"
    ).unwrap();

    // Client code + uppercase name on the same label
    pub static ref CLIENT: Regex = Regex::new(
        r"(?i:Cliente)\s+(\d+)\s+([A-ZÁÉÍÓÚÂÊÔÃÕÇ ]{5,})"
    ).unwrap();

    pub static ref CLIENT_CODE: Regex = Regex::new(
        r"(?i)C[oó]digo\s+do\s+Cliente\s+(\d+)"
    ).unwrap();

    // Uppercase name line, one free line, then the branch code (ddddd-ddd)
    pub static ref CLIENT_NAME_BEFORE_BRANCH: Regex = Regex::new(
        r"\n([A-ZÁÉÍÓÚÂÊÔÃÕÇ ]{5,})\n[^\n]*\n\d{5}-\d{3}"
    ).unwrap();

    pub static ref CLIENT_CODE_DETAIL: Regex = Regex::new(
        r"(?i)C[oó]digo\s+cliente\s+([^\n]+)"
    ).unwrap();

    // CPF: ddd.ddd.ddd-dd
    pub static ref TAX_ID: Regex = Regex::new(
        r"\d{3}\.\d{3}\.\d{3}-\d{2}"
    ).unwrap();

    pub static ref ADVISOR: Regex = Regex::new(
        r"(?i)Assessor\s+(\d+)"
    ).unwrap();

    // Flattened cash-equity trade line
    pub static ref BOVESPA_LINE: Regex = Regex::new(
        r"^(?P<sequence>\d+-BOVESPA)\s+(?P<side>C|V)\s+(?P<market>\S+)\s+(?P<middle>.+?)\s+(?P<quantity>\d+)\s+(?P<price>\d{1,3}(?:\.\d{3})*,\d+)\s+(?P<value>\d{1,3}(?:\.\d{3})*,\d+)\s+(?P<dc>C|D)$"
    ).unwrap();

    // Exchange sequence line opening a multi-line block
    pub static ref TRADE_SEQUENCE: Regex = Regex::new(
        r"^\d+-(BOVESPA|BMF)$"
    ).unwrap();

    pub static ref INTEGER: Regex = Regex::new(
        r"^\d+$"
    ).unwrap();

    // Equity ticker: PETR4, BOVA11, TAEE11F
    pub static ref EQUITY_TICKER: Regex = Regex::new(
        r"^[A-Z]{3,}[0-9]{1,2}[A-Z0-9]*$"
    ).unwrap();

    // Option ticker: 4 letters + series letter + strike digits
    pub static ref OPTION_TICKER: Regex = Regex::new(
        r"^[A-Z]{4}[A-Z]\d{2,3}[A-Z]?$"
    ).unwrap();

    pub static ref OBSERVATION_SEPARATORS: Regex = Regex::new(
        r"[\s|/]+"
    ).unwrap();

    pub static ref STANDALONE_F: Regex = Regex::new(
        r"(?:^|\s)F(?:\s|$)"
    ).unwrap();
}
