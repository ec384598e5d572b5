//! Compliance flags derived from a single operation record.
//!
//! Every rule looks at one record only, so records can be classified in any
//! order. Coverage (`F`) is not an alert by itself; it suppresses the
//! mini-contract, rate-futures and option flags.

use tracing::debug;

use crate::models::note::{ClassifiedRecord, ComplianceFlags, Layout, OperationRecord};
use crate::note::rules::legend::tokenize;
use crate::note::rules::patterns::{OPTION_TICKER, STANDALONE_F};

const DAY_TRADE_LABEL: &str = "DAY TRADE";
const FORWARD_MARKET_MARKER: &str = "TERMO";
const MINI_CONTRACT_PREFIXES: [&str; 2] = ["WIN", "WDO"];
const RATE_FUTURES_PREFIX: &str = "DI";

/// Stateless rule set over operation records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassificationEngine;

impl ClassificationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Flags for one record.
    pub fn flags(&self, record: &OperationRecord) -> ComplianceFlags {
        let op = &record.operation;
        let tokens = tokenize(&op.observation);
        let has_token = |code: &str| tokens.iter().any(|t| t == code);

        let asset = op.asset.to_uppercase();

        let is_coverage = op.observation_codes.contains('F')
            || has_token("F")
            || STANDALONE_F.is_match(&op.source_line.to_uppercase());

        let is_day_trade = match op.layout {
            Layout::Bmf => op.trade_type().trim().to_uppercase() == DAY_TRADE_LABEL,
            Layout::Bovespa => op.observation_codes.contains('D') || has_token("D"),
        };

        let is_mini_contract =
            MINI_CONTRACT_PREFIXES.iter().any(|p| asset.starts_with(p)) && !is_coverage;

        let is_rate_futures =
            op.layout == Layout::Bmf && asset.starts_with(RATE_FUTURES_PREFIX) && !is_coverage;

        let is_option =
            op.layout == Layout::Bovespa && OPTION_TICKER.is_match(asset.trim()) && !is_coverage;

        let is_forward_market = op.market_type.to_uppercase().contains(FORWARD_MARKET_MARKER);

        let alert =
            is_day_trade || is_mini_contract || is_rate_futures || is_option || is_forward_market;

        ComplianceFlags {
            is_coverage,
            is_day_trade,
            is_mini_contract,
            is_rate_futures,
            is_option,
            is_forward_market,
            alert,
        }
    }

    /// Attach flags to a record.
    pub fn classify(&self, record: OperationRecord) -> ClassifiedRecord {
        let flags = self.flags(&record);
        ClassifiedRecord { record, flags }
    }

    /// Classify a batch, preserving order.
    pub fn classify_all(&self, records: Vec<OperationRecord>) -> Vec<ClassifiedRecord> {
        let classified: Vec<ClassifiedRecord> =
            records.into_iter().map(|r| self.classify(r)).collect();

        debug!(
            "classified {} records, {} alerts",
            classified.len(),
            classified.iter().filter(|c| c.flags.alert).count()
        );
        classified
    }
}

/// Classify one record with the default engine.
pub fn classify(record: OperationRecord) -> ClassifiedRecord {
    ClassificationEngine::new().classify(record)
}

/// Classify a batch with the default engine.
pub fn classify_all(records: Vec<OperationRecord>) -> Vec<ClassifiedRecord> {
    ClassificationEngine::new().classify_all(records)
}
