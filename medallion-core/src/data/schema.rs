use polars::prelude::*;

pub const TIMESTAMP: &str = "timestamp";
pub const OPEN: &str = "open";
pub const HIGH: &str = "high";
pub const LOW: &str = "low";
pub const CLOSE: &str = "close";
pub const VOLUME: &str = "volume";
pub const ADJUSTED_CLOSE: &str = "adjusted_close";

/// Numeric bar columns, in table order.
pub const NUMERIC_COLUMNS: [&str; 6] = [OPEN, HIGH, LOW, CLOSE, VOLUME, ADJUSTED_CLOSE];

/// Vendor column names and their canonical equivalents.
pub const COLUMN_ALIASES: [(&str, &str); 10] = [
    ("Open", OPEN),
    ("High", HIGH),
    ("Low", LOW),
    ("Close", CLOSE),
    ("Volume", VOLUME),
    ("Adj Close", ADJUSTED_CLOSE),
    ("adj_close", ADJUSTED_CLOSE),
    ("Date", TIMESTAMP),
    ("date", TIMESTAMP),
    ("Datetime", TIMESTAMP),
];

/// Canonical name for a vendor column, if it has one.
pub fn canonical_name(column: &str) -> Option<&'static str> {
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == column)
        .map(|(_, canonical)| *canonical)
}

/// Required columns of a bar table.
pub struct BarSchema;

impl BarSchema {
    /// Columns a table cannot be read as bars without.
    pub fn missing_required(df: &DataFrame) -> Vec<String> {
        [TIMESTAMP, CLOSE]
            .iter()
            .filter(|name| df.column(name).is_err())
            .map(|name| name.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::bars_to_frame;
    use crate::domain::PriceBar;
    use chrono::{TimeZone, Utc};

    #[test]
    fn bar_table_has_required_columns() {
        let bars = vec![PriceBar {
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            open: 400.0,
            high: 405.0,
            low: 399.0,
            close: 403.0,
            volume: 1_000_000,
            adjusted_close: None,
        }];
        let df = bars_to_frame(&bars).unwrap();
        assert!(BarSchema::missing_required(&df).is_empty());
        let df = df.drop(CLOSE).unwrap();
        assert_eq!(BarSchema::missing_required(&df), vec![CLOSE.to_string()]);
    }

    #[test]
    fn aliases_map_vendor_names() {
        assert_eq!(canonical_name("Adj Close"), Some(ADJUSTED_CLOSE));
        assert_eq!(canonical_name("Datetime"), Some(TIMESTAMP));
        assert_eq!(canonical_name("close"), None);
    }
}
