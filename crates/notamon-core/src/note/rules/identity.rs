//! Identity keys and ids used to deduplicate operations across runs.
//!
//! The key keeps literal price/value text and the verbatim source line, so
//! two records only collide when they were printed identically. The id is
//! the MD5 hex digest of the key's UTF-8 bytes (32 lowercase hex chars).

use crate::models::note::{OperationRecord, PageHeader, RawOperation};

/// Delimiter between key fields.
pub const KEY_DELIMITER: &str = "|";

/// Canonical key of a record, in fixed field order.
pub fn build_key(record: &OperationRecord) -> String {
    key_from_parts(&record.document, record.page, &record.header, &record.operation)
}

/// Canonical key from a record's parts.
pub fn key_from_parts(document: &str, page: u32, header: &PageHeader, op: &RawOperation) -> String {
    let page = page.to_string();
    let quantity = op.quantity_key();

    [
        document,
        page.as_str(),
        header.note_number.as_str(),
        header.sheet.as_str(),
        header.trade_date.as_str(),
        header.client_code.as_str(),
        header.client_name.as_str(),
        header.client_tax_id.as_str(),
        header.advisor.as_str(),
        op.trade_sequence.as_str(),
        op.side.as_str(),
        op.market_type.as_str(),
        op.asset.as_str(),
        op.observation.as_str(),
        quantity.as_str(),
        op.price_text.as_str(),
        op.value_text.as_str(),
        op.debit_credit.as_str(),
        op.source_line.as_str(),
    ]
    .join(KEY_DELIMITER)
}

/// Deterministic id of a key.
pub fn derive_id(key: &str) -> String {
    format!("{:x}", md5::compute(key.as_bytes()))
}

impl OperationRecord {
    /// Merge an operation with its page and compute its identity.
    pub fn new(document: impl Into<String>, page: u32, header: PageHeader, operation: RawOperation) -> Self {
        let document = document.into();
        let identity_key = key_from_parts(&document, page, &header, &operation);
        let operation_id = derive_id(&identity_key);

        Self {
            document,
            page,
            header,
            operation,
            identity_key,
            operation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note::Layout;

    fn sample() -> OperationRecord {
        let header = PageHeader {
            note_number: "0001234".to_string(),
            sheet: "1".to_string(),
            trade_date: "2024-03-15".to_string(),
            client_code: "445566".to_string(),
            client_name: "MARIA SOUZA".to_string(),
            ..PageHeader::default()
        };

        let mut op = RawOperation::new(Layout::Bovespa);
        op.trade_sequence = "1-BOVESPA".to_string();
        op.side = "C".to_string();
        op.market_type = "VISTA".to_string();
        op.asset = "PETR4".to_string();
        op.quantity = Some(100);
        op.quantity_text = "100".to_string();
        op.price_text = "25,50".to_string();
        op.value_text = "2.550,00".to_string();
        op.debit_credit = "D".to_string();
        op.source_line = "1-BOVESPA C VISTA PETR4 100 25,50 2.550,00 D".to_string();

        OperationRecord::new("nota.pdf", 1, header, op)
    }

    #[test]
    fn test_key_field_order() {
        let record = sample();
        assert_eq!(
            record.identity_key,
            "nota.pdf|1|0001234|1|2024-03-15|445566|MARIA SOUZA|||1-BOVESPA|C|VISTA|PETR4||100|25,50|2.550,00|D|1-BOVESPA C VISTA PETR4 100 25,50 2.550,00 D"
        );
        assert_eq!(build_key(&record), record.identity_key);
    }

    #[test]
    fn test_id_is_md5_hex() {
        assert_eq!(derive_id(""), "d41d8cd98f00b204e9800998ecf8427e");
        let id = sample().operation_id;
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_same_key_same_id() {
        assert_eq!(sample().operation_id, sample().operation_id);
    }

    #[test]
    fn test_literal_whitespace_changes_id() {
        let a = sample();
        let mut op = a.operation.clone();
        op.source_line = format!("{} ", op.source_line);
        let b = OperationRecord::new(a.document.clone(), a.page, a.header.clone(), op);

        assert_ne!(a.identity_key, b.identity_key);
        assert_ne!(a.operation_id, b.operation_id);
    }

    #[test]
    fn test_page_changes_id() {
        let a = sample();
        let b = OperationRecord::new(a.document.clone(), 2, a.header.clone(), a.operation.clone());
        assert_ne!(a.operation_id, b.operation_id);
    }
}
