//! Brazilian-formatted numbers (`1.234,56`).

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a Brazilian-formatted decimal: `.` groups thousands, `,` is the
/// decimal separator. Returns `None` for empty or malformed text.
pub fn parse_br_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let normalized = s.replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).ok()
}

/// Parse a plain unsigned integer quantity.
pub fn parse_quantity(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_br_amount() {
        assert_eq!(parse_br_amount("25,50"), Some(Decimal::new(2550, 2)));
        assert_eq!(parse_br_amount("2.550,00"), Some(Decimal::new(255000, 2)));
        assert_eq!(parse_br_amount("1.234.567,8"), Some(Decimal::new(12345678, 1)));
        assert_eq!(parse_br_amount(" 0,0123 "), Some(Decimal::new(123, 4)));
    }

    #[test]
    fn test_parse_br_amount_rejects_garbage() {
        assert_eq!(parse_br_amount(""), None);
        assert_eq!(parse_br_amount("   "), None);
        assert_eq!(parse_br_amount("DAY TRADE"), None);
        assert_eq!(parse_br_amount("1,2,3"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("100"), Some(100));
        assert_eq!(parse_quantity("0100"), Some(100));
        assert_eq!(parse_quantity("1.000"), None);
        assert_eq!(parse_quantity("-5"), None);
        assert_eq!(parse_quantity(""), None);
    }
}
