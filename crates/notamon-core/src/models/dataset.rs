//! Flat tabular view of classified records.

use std::collections::HashSet;

use super::note::{ClassifiedRecord, Layout, OperationRecord};

/// Output columns in their fixed order: general identity, common operation
/// fields, BOVESPA-only, BMF-only, then compliance flags.
pub const COLUMNS: [&str; 43] = [
    // general
    "document",
    "page",
    "note_number",
    "sheet",
    "trade_date",
    "client_code",
    "client_code_detail",
    "client_name",
    "client_tax_id",
    "advisor",
    "operation_id",
    "identity_key",
    "layout",
    // operation
    "side",
    "market_type",
    "asset",
    "description",
    "observation",
    "observation_codes",
    "observation_meaning",
    "quantity",
    "quantity_text",
    "price",
    "price_text",
    "value",
    "value_text",
    "debit_credit",
    "source_line",
    // bovespa
    "trade_sequence",
    // bmf
    "bmf_commodity",
    "bmf_maturity_code",
    "bmf_maturity_date",
    "bmf_trade_type",
    "bmf_fee_text",
    "bmf_fee",
    // flags
    "is_coverage",
    "is_day_trade",
    "is_mini_contract",
    "is_rate_futures",
    "is_option",
    "is_forward_market",
    "alert",
    "alert_int",
];

/// Index of the `operation_id` column.
pub const OPERATION_ID_COLUMN: usize = 10;

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl ClassifiedRecord {
    /// Render as one row aligned with [`COLUMNS`]. Absent values are empty strings.
    pub fn to_row(&self) -> Vec<String> {
        let record = &self.record;
        let header = &record.header;
        let op = &record.operation;
        let flags = &self.flags;
        let bmf = op.bmf.clone().unwrap_or_default();

        let trade_sequence = match op.layout {
            Layout::Bovespa => op.trade_sequence.clone(),
            Layout::Bmf => String::new(),
        };

        vec![
            record.document.clone(),
            record.page.to_string(),
            header.note_number.clone(),
            header.sheet.clone(),
            header.trade_date.clone(),
            header.client_code.clone(),
            header.client_code_detail.clone().unwrap_or_default(),
            header.client_name.clone(),
            header.client_tax_id.clone(),
            header.advisor.clone(),
            record.operation_id.clone(),
            record.identity_key.clone(),
            op.layout.to_string(),
            op.side.clone(),
            op.market_type.clone(),
            op.asset.clone(),
            op.description.clone(),
            op.observation.clone(),
            op.observation_codes.joined(),
            crate::note::rules::legend::describe(&op.observation_codes),
            opt(op.quantity),
            op.quantity_text.clone(),
            opt(op.price),
            op.price_text.clone(),
            opt(op.value),
            op.value_text.clone(),
            op.debit_credit.clone(),
            op.source_line.clone(),
            trade_sequence,
            bmf.commodity,
            bmf.maturity_code,
            bmf.maturity_date,
            bmf.trade_type,
            bmf.fee_text,
            opt(bmf.fee),
            flags.is_coverage.to_string(),
            flags.is_day_trade.to_string(),
            flags.is_mini_contract.to_string(),
            flags.is_rate_futures.to_string(),
            flags.is_option.to_string(),
            flags.is_forward_market.to_string(),
            flags.alert.to_string(),
            if flags.alert { "1" } else { "0" }.to_string(),
        ]
    }
}

/// Records with an identity id.
pub trait HasOperationId {
    fn operation_id(&self) -> &str;
}

impl HasOperationId for OperationRecord {
    fn operation_id(&self) -> &str {
        &self.operation_id
    }
}

impl HasOperationId for ClassifiedRecord {
    fn operation_id(&self) -> &str {
        &self.record.operation_id
    }
}

/// Keep the first record of every identity id, preserving order.
pub fn dedupe_by_id<T: HasOperationId>(records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.operation_id().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::{BmfDetails, ComplianceFlags, PageHeader, RawOperation};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn column(name: &str) -> usize {
        COLUMNS.iter().position(|c| *c == name).unwrap()
    }

    fn record(document: &str, source: &str) -> OperationRecord {
        let mut op = RawOperation::new(Layout::Bovespa);
        op.trade_sequence = "1-BOVESPA".to_string();
        op.asset = "PETR4".to_string();
        op.quantity = Some(100);
        op.quantity_text = "100".to_string();
        op.price = Some(Decimal::new(2550, 2));
        op.price_text = "25,50".to_string();
        op.source_line = source.to_string();
        OperationRecord::new(document, 1, PageHeader::default(), op)
    }

    #[test]
    fn test_columns_unique_and_id_index() {
        let unique: HashSet<_> = COLUMNS.iter().collect();
        assert_eq!(unique.len(), COLUMNS.len());
        assert_eq!(COLUMNS[OPERATION_ID_COLUMN], "operation_id");
    }

    #[test]
    fn test_row_matches_columns() {
        let classified = ClassifiedRecord {
            record: record("a.pdf", "line"),
            flags: ComplianceFlags {
                is_day_trade: true,
                alert: true,
                ..ComplianceFlags::default()
            },
        };
        let row = classified.to_row();

        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[column("document")], "a.pdf");
        assert_eq!(row[column("layout")], "BOVESPA");
        assert_eq!(row[column("price")], "25.50");
        assert_eq!(row[column("value")], "");
        assert_eq!(row[column("trade_sequence")], "1-BOVESPA");
        assert_eq!(row[column("bmf_fee")], "");
        assert_eq!(row[column("is_day_trade")], "true");
        assert_eq!(row[column("is_option")], "false");
        assert_eq!(row[column("alert_int")], "1");
        assert_eq!(row[OPERATION_ID_COLUMN], classified.record.operation_id);
    }

    #[test]
    fn test_bmf_row_fields() {
        let mut op = RawOperation::new(Layout::Bmf);
        op.asset = "WDO".to_string();
        op.bmf = Some(BmfDetails {
            commodity: "WDO F24".to_string(),
            maturity_code: "F24".to_string(),
            fee_text: "2,35".to_string(),
            fee: Some(Decimal::new(235, 2)),
            ..BmfDetails::default()
        });
        let classified = ClassifiedRecord {
            record: OperationRecord::new("b.pdf", 2, PageHeader::default(), op),
            flags: ComplianceFlags::default(),
        };
        let row = classified.to_row();

        assert_eq!(row[column("bmf_commodity")], "WDO F24");
        assert_eq!(row[column("bmf_maturity_code")], "F24");
        assert_eq!(row[column("bmf_fee")], "2.35");
        assert_eq!(row[column("trade_sequence")], "");
        assert_eq!(row[column("alert_int")], "0");
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let a = record("a.pdf", "x");
        let b = record("a.pdf", "y");
        let a_again = record("a.pdf", "x");

        let deduped = dedupe_by_id(vec![a.clone(), b.clone(), a_again]);
        assert_eq!(deduped, vec![a, b]);
    }
}
