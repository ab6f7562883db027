use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// A raw spreadsheet row: normalized header -> cell text
pub type RawRow = HashMap<String, String>;

/// A validated row ready for chunking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedRow {
    pub traded_on: NaiveDate,
    /// Price normalized to a fixed six-decimal string
    pub price: String,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Turns untrusted spreadsheet rows into `(date, price)` records
///
/// Malformed rows are dropped, not errors: partial-garbage spreadsheets
/// are expected input and must not fail an import.
#[derive(Debug, Default, Clone)]
pub struct RowSanitizer;

impl RowSanitizer {
    pub fn new() -> Self {
        Self
    }

    /// Validate and normalize one raw row; `None` discards it
    pub fn sanitize(&self, row: &RawRow) -> Option<SanitizedRow> {
        let date_value = non_empty(row.get("date"))?;
        let price_value =
            non_empty(row.get("stock_price")).or_else(|| non_empty(row.get("price")))?;

        let traded_on = parse_date(date_value)?;
        let price = parse_price(price_value)?;

        Some(SanitizedRow {
            traded_on,
            price: format!("{:.6}", price),
        })
    }

    /// Sanitize a slice of rows, keeping only the valid ones
    pub fn sanitize_all(&self, rows: &[RawRow]) -> Vec<SanitizedRow> {
        rows.iter().filter_map(|row| self.sanitize(row)).collect()
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Permissive date parsing across the representations spreadsheets
/// commonly carry
fn parse_date(value: &str) -> Option<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }

    None
}

/// Accept anything representable as a finite float; exact decimal handling
/// happens later in the Price value type
fn parse_price(value: &str) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(price) if price.is_finite() => Some(price),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_accepts_well_formed_rows() {
        let sanitizer = RowSanitizer::new();

        let sanitized = sanitizer
            .sanitize(&row(&[("date", "2024-05-10"), ("stock_price", "72.5")]))
            .unwrap();

        assert_eq!(sanitized.traded_on, date(2024, 5, 10));
        assert_eq!(sanitized.price, "72.500000");
    }

    #[test]
    fn test_price_falls_back_to_plain_price_column() {
        let sanitizer = RowSanitizer::new();

        let sanitized = sanitizer
            .sanitize(&row(&[("date", "2024-05-10"), ("price", "10")]))
            .unwrap();

        assert_eq!(sanitized.price, "10.000000");
    }

    #[test]
    fn test_stock_price_wins_over_price_when_both_present() {
        let sanitizer = RowSanitizer::new();

        let sanitized = sanitizer
            .sanitize(&row(&[
                ("date", "2024-05-10"),
                ("stock_price", "11"),
                ("price", "22"),
            ]))
            .unwrap();

        assert_eq!(sanitized.price, "11.000000");
    }

    #[test]
    fn test_accepts_multiple_date_representations() {
        let sanitizer = RowSanitizer::new();

        for value in [
            "2024-05-10",
            "2024/05/10",
            "05/10/2024",
            "10-05-2024",
            "2024-05-10 16:00:00",
            "2024-05-10T16:00:00+00:00",
        ] {
            let sanitized = sanitizer
                .sanitize(&row(&[("date", value), ("price", "1")]))
                .unwrap_or_else(|| panic!("expected {} to parse", value));
            assert_eq!(sanitized.traded_on, date(2024, 5, 10));
        }
    }

    #[test]
    fn test_drops_rows_with_missing_or_empty_fields() {
        let sanitizer = RowSanitizer::new();

        assert!(sanitizer.sanitize(&row(&[("price", "10")])).is_none());
        assert!(sanitizer.sanitize(&row(&[("date", "2024-05-10")])).is_none());
        assert!(sanitizer
            .sanitize(&row(&[("date", "  "), ("price", "10")]))
            .is_none());
        assert!(sanitizer
            .sanitize(&row(&[("date", "2024-05-10"), ("price", "")]))
            .is_none());
    }

    #[test]
    fn test_drops_rows_with_unparseable_values() {
        let sanitizer = RowSanitizer::new();

        assert!(sanitizer
            .sanitize(&row(&[("date", "not a date"), ("price", "10")]))
            .is_none());
        assert!(sanitizer
            .sanitize(&row(&[("date", "2024-05-10"), ("price", "ten dollars")]))
            .is_none());
        assert!(sanitizer
            .sanitize(&row(&[("date", "2024-05-10"), ("price", "NaN")]))
            .is_none());
    }

    #[test]
    fn test_sanitize_all_filters_garbage() {
        let sanitizer = RowSanitizer::new();

        let rows = vec![
            row(&[("date", "2024-05-10"), ("price", "10")]),
            row(&[("date", "garbage"), ("price", "10")]),
            row(&[("date", "2024-05-11"), ("price", "11.25")]),
        ];

        let sanitized = sanitizer.sanitize_all(&rows);
        assert_eq!(sanitized.len(), 2);
        assert_eq!(sanitized[1].price, "11.250000");
    }
}
